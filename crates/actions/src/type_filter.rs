//! Type-filter mode - echo records whose type fully matches a regex

use regex::Regex;

use dmsift_pipeline::{EngineError, RecordAction, SubmitHandle};
use dmsift_record::{Job, Packet};

use crate::context::ExecContext;

pub(crate) struct TypeMatchEcho {
    pattern: Regex,
}

impl TypeMatchEcho {
    /// Compile the user pattern, anchored so the whole type_id must match.
    pub(crate) fn new(pattern: &str) -> Result<Self, EngineError> {
        let anchored = format!("^(?:{pattern})$");
        let pattern = Regex::new(&anchored).map_err(|e| {
            EngineError::argument(format!("invalid type filter regex: {e}"))
        })?;
        Ok(Self { pattern })
    }
}

impl RecordAction<ExecContext> for TypeMatchEcho {
    fn applies(&self, _packet: &Packet, _job: &Job) -> bool {
        true
    }

    fn run(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<ExecContext>,
    ) -> Result<(), EngineError> {
        if self.pattern.is_match(&packet.type_id()) {
            let text = job.text;
            submit.submit(move |ctx| ctx.write_line(&text));
        } else {
            submit.submit(|_ctx| Ok(()));
        }
        Ok(())
    }

    fn unconditional(&self) -> bool {
        true
    }
}
