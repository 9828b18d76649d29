//! Range mode - echo records inside configured time ranges
//!
//! The range file holds one inclusive `START END` pair of unix-second
//! timestamps per line. A record passes when its timestamp, at second
//! resolution, falls inside any range; passing records are echoed
//! verbatim.

use dmsift_pipeline::{EngineError, RecordAction, SubmitHandle};
use dmsift_record::{Job, Packet, PacketTime};
use tracing::warn;

use crate::context::ExecContext;

/// Parse the contents of a range file.
///
/// Lines hold two whitespace-separated unix-second timestamps; blank lines
/// are ignored.
pub fn parse_time_ranges(text: &str) -> Result<Vec<(i64, i64)>, EngineError> {
    let mut ranges = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let parsed = match fields.as_slice() {
            [start, end] => start
                .parse::<i64>()
                .ok()
                .zip(end.parse::<i64>().ok()),
            _ => None,
        };
        match parsed {
            Some(range) => ranges.push(range),
            None => {
                return Err(EngineError::argument(format!(
                    "range file line {}: expected two unix timestamps, got {line:?}",
                    idx + 1
                )))
            }
        }
    }
    Ok(ranges)
}

/// Action echoing records whose timestamp falls in any configured range.
pub(crate) struct RangeEcho {
    ranges: Vec<(i64, i64)>,
}

impl RangeEcho {
    pub(crate) fn new(ranges: Vec<(i64, i64)>) -> Self {
        Self { ranges }
    }
}

impl RecordAction<ExecContext> for RangeEcho {
    fn applies(&self, _packet: &Packet, _job: &Job) -> bool {
        true
    }

    fn run(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<ExecContext>,
    ) -> Result<(), EngineError> {
        let timestamp = packet.timestamp_display();
        let Some(time) = PacketTime::parse(&timestamp) else {
            submit.submit(move |_ctx| {
                warn!(
                    timestamp = %timestamp,
                    "record timestamp is unparseable, dropping"
                );
                Ok(())
            });
            return Ok(());
        };

        let secs = time.unix_seconds();
        let within = self
            .ranges
            .iter()
            .any(|&(start, end)| start <= secs && secs <= end);
        if within {
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

#[cfg(test)]
#[path = "range_test.rs"]
mod tests;
