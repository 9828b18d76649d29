//! In-order executor - serializes deferred output tasks by sequence number
//!
//! Workers finish jobs in whatever order the scheduler dictates; output must
//! not. Each worker therefore submits its record's side effects as a
//! deferred task keyed by the job's sequence number. A single executor
//! thread buffers tasks in a min-heap and runs them strictly in ascending,
//! contiguous order.
//!
//! Because exactly one thread runs the tasks, everything they touch through
//! `&mut C` - the output sink and any cross-record bookkeeping - is ordered
//! and race-free without further locking.
//!
//! The producers guarantee a dense sequence: every job submits exactly one
//! task. [`SubmitHandle`] makes that structural - it is consumed by the
//! first submission, and a handle dropped without one submits a no-op in
//! its place.

use std::collections::BinaryHeap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{EngineError, Supervisor};

/// A deferred side effect, run on the executor thread with the context.
pub type Task<C> = Box<dyn FnOnce(&mut C) -> Result<(), EngineError> + Send>;

/// Heap entry; ordered so the smallest sequence number is at the top.
struct Pending<C> {
    seq: u64,
    task: Task<C>,
}

impl<C> PartialEq for Pending<C> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<C> Eq for Pending<C> {}

impl<C> PartialOrd for Pending<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Pending<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the minimum seq on top.
        other.seq.cmp(&self.seq)
    }
}

struct ExecutorState<C> {
    pending: BinaryHeap<Pending<C>>,
    next_seq: u64,
    no_more_tasks: bool,
    cancelled: bool,
}

struct Shared<C> {
    state: Mutex<ExecutorState<C>>,
    ready: Condvar,
}

/// Handle to the executor, cloneable across worker threads.
pub struct InOrderExecutor<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for InOrderExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: 'static> InOrderExecutor<C> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ExecutorState {
                    pending: BinaryHeap::new(),
                    next_seq: 0,
                    no_more_tasks: false,
                    cancelled: false,
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// Submit the task for sequence number `seq`. Safe from any thread.
    pub fn submit(&self, seq: u64, task: Task<C>) {
        let mut state = self.shared.state.lock();
        if seq == state.next_seq {
            self.shared.ready.notify_one();
        }
        state.pending.push(Pending { seq, task });
    }

    /// Create the single-use submission handle for one job.
    pub fn handle(&self, seq: u64) -> SubmitHandle<C> {
        SubmitHandle {
            executor: self.clone(),
            seq,
            submitted: false,
        }
    }

    /// The producers have all retired; drain what is buffered and stop.
    pub fn finish(&self) {
        let mut state = self.shared.state.lock();
        state.no_more_tasks = true;
        self.shared.ready.notify_one();
    }

    /// Cancel the run; the executor exits without draining.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        self.shared.ready.notify_one();
    }

    /// Executor thread body. Owns the context for the whole run and hands it
    /// back when done so the caller can finalize it.
    pub(crate) fn run(&self, mut ctx: C, supervisor: &Supervisor) -> C {
        loop {
            let mut state = self.shared.state.lock();

            loop {
                let head_ready = state
                    .pending
                    .peek()
                    .is_some_and(|p| p.seq == state.next_seq);
                if state.cancelled || state.no_more_tasks || head_ready {
                    break;
                }
                self.shared.ready.wait(&mut state);
            }

            if state.cancelled {
                return ctx;
            }

            if state.no_more_tasks {
                if state.pending.is_empty() {
                    drop(state);
                    if let Err(e) = supervisor.executor_finished() {
                        supervisor.report_error(e);
                    }
                    return ctx;
                }
                if state.pending.peek().is_some_and(|p| p.seq != state.next_seq) {
                    drop(state);
                    supervisor.report_error(EngineError::bug(
                        "tasks remain after all producers retired, but their \
                         sequence numbers are not contiguous with the next \
                         expected one",
                    ));
                    return ctx;
                }
            }

            // Drain the contiguous run at the head of the heap. The lock is
            // held across task execution; submissions queue up behind it.
            while state
                .pending
                .peek()
                .is_some_and(|p| p.seq == state.next_seq)
            {
                let Some(pending) = state.pending.pop() else {
                    break;
                };
                state.next_seq += 1;
                if let Err(e) = (pending.task)(&mut ctx) {
                    drop(state);
                    supervisor.report_error(e);
                    return ctx;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn next_seq(&self) -> u64 {
        self.shared.state.lock().next_seq
    }
}

impl<C: 'static> Default for InOrderExecutor<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-use submission right for one job's sequence number.
///
/// Consumed by [`SubmitHandle::submit`]. Dropping it unsubmitted files a
/// no-op task instead, so a matched record that turns out to have nothing
/// to emit still keeps the sequence dense.
pub struct SubmitHandle<C: 'static> {
    executor: InOrderExecutor<C>,
    seq: u64,
    submitted: bool,
}

impl<C: 'static> SubmitHandle<C> {
    /// The sequence number this handle submits for.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Submit the job's one deferred task.
    pub fn submit<F>(mut self, task: F)
    where
        F: FnOnce(&mut C) -> Result<(), EngineError> + Send + 'static,
    {
        self.submitted = true;
        self.executor.submit(self.seq, Box::new(task));
    }
}

impl<C: 'static> Drop for SubmitHandle<C> {
    fn drop(&mut self) {
        if !self.submitted {
            self.executor
                .submit(self.seq, Box::new(|_ctx: &mut C| Ok(())));
        }
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
