//! Action pipeline - first-match dispatch of per-record work
//!
//! Each run mode configures an ordered list of actions. For every record,
//! the worker asks each action in turn whether it applies; the first one
//! that does receives ownership of the parsed tree and the job, plus the
//! single-use [`SubmitHandle`] for the job's sequence number. Scanning
//! stops there: at most one action runs per record.
//!
//! The pipeline keeps the sequence dense by construction: if no configured
//! action is unconditional, a terminal catch-all is appended that submits
//! a no-op task for records nothing else claimed.

use dmsift_record::{Job, Packet};

use crate::{EngineError, SubmitHandle};

/// One (predicate, action) pair.
pub trait RecordAction<C: 'static>: Send + Sync {
    /// Whether this action claims the record. Must be pure.
    fn applies(&self, packet: &Packet, job: &Job) -> bool;

    /// Perform the per-record work. Must submit exactly one task through
    /// `submit`; dropping the handle without submitting counts as a no-op
    /// submission.
    fn run(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<C>,
    ) -> Result<(), EngineError>;

    /// Whether `applies` returns true for every record. The pipeline skips
    /// its catch-all tail when the final configured action says so.
    fn unconditional(&self) -> bool {
        false
    }
}

/// Ordered list of actions with first-match dispatch.
pub struct ActionPipeline<C: 'static> {
    entries: Vec<Box<dyn RecordAction<C>>>,
}

impl<C: 'static> ActionPipeline<C> {
    /// Build a pipeline, appending the no-op catch-all unless the last
    /// configured entry already matches everything.
    pub fn new(mut entries: Vec<Box<dyn RecordAction<C>>>) -> Self {
        if entries.last().map_or(true, |e| !e.unconditional()) {
            entries.push(Box::new(NoopTail));
        }
        Self { entries }
    }

    /// Number of entries, catch-all included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch one record to the first matching action.
    pub fn dispatch(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<C>,
    ) -> Result<(), EngineError> {
        match self.entries.iter().position(|e| e.applies(&packet, &job)) {
            Some(i) => self.entries[i].run(packet, job, submit),
            None => Err(EngineError::bug(
                "no action matched a record; the final pipeline entry must \
                 match everything",
            )),
        }
    }
}

/// Terminal catch-all: claims every record and emits nothing.
struct NoopTail;

impl<C: 'static> RecordAction<C> for NoopTail {
    fn applies(&self, _packet: &Packet, _job: &Job) -> bool {
        true
    }

    fn run(
        &self,
        _packet: Packet,
        _job: Job,
        submit: SubmitHandle<C>,
    ) -> Result<(), EngineError> {
        submit.submit(|_ctx| Ok(()));
        Ok(())
    }

    fn unconditional(&self) -> bool {
        true
    }
}
