//! Reorder mode - stable timestamp sort within a sliding window
//!
//! Records accumulate in a window keyed by microsecond timestamp. Whenever
//! the spread between the newest and the oldest buffered record exceeds the
//! tolerance, the oldest records are evicted to the output. Records with
//! equal timestamps keep their arrival order. Whatever remains at end of
//! run is flushed in timestamp order.

use std::collections::BTreeMap;
use std::io::Write;

use dmsift_pipeline::{EngineError, RecordAction, SubmitHandle};
use dmsift_record::{Job, PacketTime};
use tracing::warn;

use crate::context::ExecContext;

/// Sliding reorder window.
#[derive(Debug)]
pub struct ReorderWindow {
    tolerance_micros: i64,
    /// Buffered record texts, keyed by timestamp; the inner vec keeps
    /// arrival order for equal timestamps.
    window: BTreeMap<i64, Vec<String>>,
}

impl ReorderWindow {
    /// Tolerance is in microseconds and must be positive.
    pub fn new(tolerance_micros: i64) -> Result<Self, EngineError> {
        if tolerance_micros <= 0 {
            return Err(EngineError::argument(format!(
                "reorder window size must be greater than 0, given: {tolerance_micros}"
            )));
        }
        Ok(Self {
            tolerance_micros,
            window: BTreeMap::new(),
        })
    }

    /// Insert one record, evicting everything older than the window allows.
    pub fn insert(
        &mut self,
        timestamp_micros: i64,
        text: String,
        out: &mut dyn Write,
    ) -> Result<(), EngineError> {
        self.window
            .entry(timestamp_micros)
            .or_default()
            .push(text);

        let Some((&newest, _)) = self.window.last_key_value() else {
            return Ok(());
        };
        while let Some((&oldest, _)) = self.window.first_key_value() {
            if newest - oldest <= self.tolerance_micros {
                break;
            }
            if let Some((_, texts)) = self.window.pop_first() {
                for text in texts {
                    writeln!(out, "{text}")?;
                }
            }
        }
        Ok(())
    }

    /// Emit everything still buffered, oldest first.
    pub fn flush(&mut self, out: &mut dyn Write) -> Result<(), EngineError> {
        for (_, texts) in std::mem::take(&mut self.window) {
            for text in texts {
                writeln!(out, "{text}")?;
            }
        }
        Ok(())
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.window.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

/// Action feeding every record into the context's reorder window.
pub(crate) struct ReorderInsert;

impl RecordAction<ExecContext> for ReorderInsert {
    fn applies(&self, _packet: &dmsift_record::Packet, _job: &Job) -> bool {
        true
    }

    fn run(
        &self,
        packet: dmsift_record::Packet,
        job: Job,
        submit: SubmitHandle<ExecContext>,
    ) -> Result<(), EngineError> {
        let timestamp = packet.timestamp_display();
        match PacketTime::parse(&timestamp) {
            Some(t) => {
                let micros = t.unix_micros();
                let text = job.text;
                submit.submit(move |ctx| ctx.reorder_insert(micros, text));
            }
            None => {
                submit.submit(move |_ctx| {
                    warn!(
                        timestamp = %timestamp,
                        "record timestamp is unparseable, dropping"
                    );
                    Ok(())
                });
            }
        }
        Ok(())
    }

    fn unconditional(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "reorder_test.rs"]
mod tests;
