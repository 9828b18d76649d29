//! Run supervisor - the state machine that sequences a run
//!
//! A run advances linearly through the phases below; the main thread blocks
//! on the phase condvar and performs the join/handoff work between stages.
//! Any component that hits a fatal error reports it here; the first report
//! wins, flips the run to `Failed`, and the main thread then cancels and
//! joins everything before surfacing the stored error.
//!
//! Stage-completion signals are only legal from the immediately preceding
//! phase. After a failure they become no-ops; from any other phase they are
//! an internal error, because it means the drain protocol broke.

use parking_lot::{Condvar, Mutex};

use crate::EngineError;

/// Phases of one run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Components are being constructed and spawned.
    Starting,
    /// Splitter, workers and executor are all running.
    Running,
    /// The splitter consumed all input and exited.
    SplitterDone,
    /// The last worker drained the queue and exited.
    ExtractorsDone,
    /// The executor drained its buffer; the run is complete.
    ExecutorDone,
    /// A component failed; terminal.
    Failed,
}

struct SupervisorInner {
    phase: RunPhase,
    error: Option<EngineError>,
}

/// Shared run state: one mutex, one condvar.
pub struct Supervisor {
    inner: Mutex<SupervisorInner>,
    changed: Condvar,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SupervisorInner {
                phase: RunPhase::Starting,
                error: None,
            }),
            changed: Condvar::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.inner.lock().phase
    }

    /// All components are spawned. No-op if a component already failed.
    pub fn start_running(&self) {
        let mut inner = self.inner.lock();
        if inner.phase == RunPhase::Starting {
            inner.phase = RunPhase::Running;
            self.changed.notify_all();
        }
    }

    /// The splitter consumed all input.
    pub fn splitter_finished(&self) -> Result<(), EngineError> {
        self.advance(RunPhase::Running, RunPhase::SplitterDone, "splitter")
    }

    /// The last worker drained the queue.
    pub fn extractors_finished(&self) -> Result<(), EngineError> {
        self.advance(
            RunPhase::SplitterDone,
            RunPhase::ExtractorsDone,
            "extractor pool",
        )
    }

    /// The executor drained its buffer.
    pub fn executor_finished(&self) -> Result<(), EngineError> {
        self.advance(
            RunPhase::ExtractorsDone,
            RunPhase::ExecutorDone,
            "executor",
        )
    }

    fn advance(
        &self,
        expected: RunPhase,
        next: RunPhase,
        who: &str,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        match inner.phase {
            phase if phase == expected => {
                inner.phase = next;
                self.changed.notify_all();
                Ok(())
            }
            RunPhase::Failed => Ok(()),
            phase => Err(EngineError::bug(format!(
                "{who} finished in phase {phase:?}, expected {expected:?}"
            ))),
        }
    }

    /// Record a fatal error and flip the run to `Failed`. The first error
    /// wins; later ones are logged and dropped.
    pub fn report_error(&self, err: EngineError) {
        let mut inner = self.inner.lock();
        if inner.phase == RunPhase::Failed {
            tracing::debug!(error = %err, "suppressing error reported after the run already failed");
            return;
        }
        tracing::debug!(error = %err, "component failed, cancelling run");
        inner.error = Some(err);
        inner.phase = RunPhase::Failed;
        self.changed.notify_all();
    }

    /// Block until the phase differs from `current`, then return it.
    pub fn wait_while_phase(&self, current: RunPhase) -> RunPhase {
        let mut inner = self.inner.lock();
        while inner.phase == current {
            self.changed.wait(&mut inner);
        }
        inner.phase
    }

    /// Remove and return the stored error, if any.
    pub fn take_error(&self) -> Option<EngineError> {
        self.inner.lock().error.take()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;
