//! Executor-side context
//!
//! One value owns the output sink and every piece of cross-record state the
//! actions maintain. It is threaded through the in-order executor, which is
//! the only thread that ever touches it, so none of this needs a lock.

use std::io::Write;

use dmsift_pipeline::EngineError;

use crate::reorder::ReorderWindow;

/// Direction of the last PDCP data transmission seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdcpDirection {
    Unknown,
    Uplink,
    Downlink,
}

impl PdcpDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Uplink => "uplink",
            Self::Downlink => "downlink",
        }
    }
}

/// RRC-layer events that disrupt the data connection. The next full-size
/// PDCP data PDU after any of these is reported, which is how
/// reconnection gaps are measured from the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisruptionKind {
    ReestablishmentRequest,
    ReestablishmentComplete,
    Reconfiguration,
    ReconfigurationComplete,
    ConnectionRequest,
    ConnectionSetup,
}

impl DisruptionKind {
    pub const ALL: [Self; 6] = [
        Self::ReestablishmentRequest,
        Self::ReestablishmentComplete,
        Self::Reconfiguration,
        Self::ReconfigurationComplete,
        Self::ConnectionRequest,
        Self::ConnectionSetup,
    ];

    /// Label used in output lines, matching the RRC message names.
    pub fn label(self) -> &'static str {
        match self {
            Self::ReestablishmentRequest => "rrcConnectionReestablishmentRequest",
            Self::ReestablishmentComplete => "rrcConnectionReestablishmentComplete",
            Self::Reconfiguration => "rrcConnectionReconfiguration",
            Self::ReconfigurationComplete => "rrcConnectionReconfigurationComplete",
            Self::ConnectionRequest => "rrcConnectionRequest",
            Self::ConnectionSetup => "rrcConnectionSetup",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }
}

/// Pending disruption events awaiting the next PDCP data PDU.
#[derive(Debug, Default)]
pub(crate) struct DisruptionSet {
    active: bool,
    flags: [bool; DisruptionKind::ALL.len()],
}

impl DisruptionSet {
    pub(crate) fn mark(&mut self, kind: DisruptionKind) {
        self.active = true;
        self.flags[kind.index()] = true;
    }

    /// Remove and return the pending kinds, in declaration order.
    pub(crate) fn drain(&mut self) -> Vec<DisruptionKind> {
        if !self.active {
            return Vec::new();
        }
        let drained = DisruptionKind::ALL
            .iter()
            .copied()
            .filter(|k| self.flags[k.index()])
            .collect();
        self.flags = Default::default();
        self.active = false;
        drained
    }
}

/// Dedup high-water mark: the newest timestamp already emitted.
#[derive(Debug)]
pub(crate) struct DedupWatermark {
    pub(crate) newest_micros: i64,
    /// Display form of the newest timestamp, for drop diagnostics.
    pub(crate) newest_repr: String,
}

impl Default for DedupWatermark {
    fn default() -> Self {
        Self {
            newest_micros: i64::MIN,
            newest_repr: String::new(),
        }
    }
}

/// State owned by the executor thread for the duration of one run.
pub struct ExecContext {
    out: Box<dyn Write + Send>,
    /// Timestamp of the last full-size PDCP data PDU, "unknown" until seen.
    pub(crate) pdcp_timestamp: String,
    pub(crate) pdcp_direction: PdcpDirection,
    pub(crate) disruptions: DisruptionSet,
    pub(crate) dedup: DedupWatermark,
    reorder: Option<ReorderWindow>,
}

impl ExecContext {
    /// Context for every mode except reorder.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            pdcp_timestamp: "unknown".to_string(),
            pdcp_direction: PdcpDirection::Unknown,
            disruptions: DisruptionSet::default(),
            dedup: DedupWatermark::default(),
            reorder: None,
        }
    }

    /// Context for reorder mode; the tolerance is in microseconds and must
    /// be positive.
    pub fn with_reorder(
        out: Box<dyn Write + Send>,
        tolerance_micros: i64,
    ) -> Result<Self, EngineError> {
        let window = ReorderWindow::new(tolerance_micros)?;
        let mut ctx = Self::new(out);
        ctx.reorder = Some(window);
        Ok(ctx)
    }

    /// Write one output line.
    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// Write a pre-assembled block of zero or more newline-terminated lines.
    pub(crate) fn write_block(&mut self, block: &str) -> Result<(), EngineError> {
        self.out.write_all(block.as_bytes())?;
        Ok(())
    }

    /// The last-PDCP stamp rendered the way extraction lines embed it.
    pub(crate) fn pdcp_stamp_display(&self) -> String {
        format!(
            "LastPDCPPacketTimestamp: {}, Direction: {}",
            self.pdcp_timestamp,
            self.pdcp_direction.as_str()
        )
    }

    /// Feed one record into the reorder window.
    pub(crate) fn reorder_insert(
        &mut self,
        timestamp_micros: i64,
        text: String,
    ) -> Result<(), EngineError> {
        let Self { out, reorder, .. } = self;
        match reorder {
            Some(window) => window.insert(timestamp_micros, text, out.as_mut()),
            None => Err(EngineError::bug(
                "reorder action ran without a reorder window configured",
            )),
        }
    }

    /// Flush everything still buffered. Call after a successful run.
    pub fn finish(mut self) -> Result<(), EngineError> {
        if let Some(mut window) = self.reorder.take() {
            window.flush(self.out.as_mut())?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
