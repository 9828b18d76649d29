//! Splitter thread - streams inputs through the scanner into the queue
//!
//! A single producer thread. It reads each input in fixed-size chunks,
//! feeds them to the [`RecordScanner`](crate::RecordScanner), wraps every
//! completed record in a [`Job`] with the next sequence number, and pushes
//! it into the bounded queue. The push blocks under back-pressure and
//! returns early on cancellation.

use std::io::Read;

use dmsift_record::Job;
use tracing::{debug, warn};

use crate::queue::{JobQueue, PushOutcome};
use crate::scanner::RecordScanner;
use crate::{EngineError, Supervisor};

/// Read buffer size for input streams.
const READ_BUF_SIZE: usize = 16 * 1024;

/// One input stream with a display name for spans and diagnostics.
pub struct InputSource {
    pub name: String,
    pub reader: Box<dyn Read + Send>,
}

impl InputSource {
    pub fn new(name: impl Into<String>, reader: Box<dyn Read + Send>) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// Splitter thread body. On clean end of input, reports completion to the
/// supervisor; on cancellation, just returns.
pub(crate) fn run_splitter(
    inputs: Vec<InputSource>,
    queue: &JobQueue,
    supervisor: &Supervisor,
) -> Result<(), EngineError> {
    let mut scanner = RecordScanner::new();
    let mut records = Vec::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut seq: u64 = 0;

    for input in inputs {
        let InputSource { name, mut reader } = input;
        debug!(input = %name, "splitting input");

        loop {
            let n = reader.read(&mut buf).map_err(|e| {
                EngineError::input(format!("failed to read from \"{name}\": {e}"))
            })?;
            if n == 0 {
                break;
            }

            scanner.feed(&buf[..n], &mut records);
            for record in records.drain(..) {
                let job = Job {
                    seq,
                    text: record.text,
                    source_name: name.clone(),
                    start_line: record.start_line,
                    end_line: record.end_line,
                };
                seq += 1;
                match queue.push(job)? {
                    PushOutcome::Pushed => {}
                    PushOutcome::Cancelled => return Ok(()),
                }
            }
        }

        if let Some((start_line, end_line)) = scanner.end_of_input() {
            warn!(
                input = %name,
                start_line,
                end_line,
                "discarding truncated record at end of input"
            );
        }
    }

    debug!(records = seq, "splitter finished");
    supervisor.splitter_finished()
}
