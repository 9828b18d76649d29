//! Job queue - bounded handoff between the splitter and the workers
//!
//! A mutex-guarded FIFO with two condition variables. The splitter is the
//! only producer; the extractor workers are the only consumers. Capacity is
//! expressed in watermarks scaled by worker count: the producer blocks once
//! the queue holds `HIGH_WATERMARK * workers` jobs and is woken again when
//! a consumer drains it to `LOW_WATERMARK * workers`, so the two sides stop
//! trading wakeups under sustained imbalance.
//!
//! The queue also owns the worker drain protocol: once the producer signals
//! end of input, each worker that finds the queue empty retires, and the
//! last one out reports the pool as drained.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use dmsift_record::Job;

use crate::EngineError;

/// Producer stalls at `HIGH_WATERMARK * workers` queued jobs.
pub const HIGH_WATERMARK: usize = 128;

/// Producer resumes at `LOW_WATERMARK * workers` queued jobs.
pub const LOW_WATERMARK: usize = 8;

/// Result of a producer push.
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// The run was cancelled while waiting for space.
    Cancelled,
}

/// Result of a consumer pop.
#[derive(Debug)]
pub enum PopOutcome {
    Job(Job),
    /// Producer finished and the queue is empty; this worker retires.
    /// `last_worker` is true for exactly one retiring worker.
    Drained { last_worker: bool },
    /// The run was cancelled; exit without retiring bookkeeping.
    Cancelled,
}

struct QueueInner {
    jobs: VecDeque<Job>,
    splitter_done: bool,
    cancelled: bool,
    alive_workers: usize,
    idle_workers: usize,
}

/// Bounded FIFO of pending jobs.
pub struct JobQueue {
    inner: Mutex<QueueInner>,
    non_empty: Condvar,
    non_full: Condvar,
    high: usize,
    low: usize,
}

impl JobQueue {
    /// Create a queue sized for `workers` consumers.
    pub fn new(workers: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                jobs: VecDeque::new(),
                splitter_done: false,
                cancelled: false,
                alive_workers: workers,
                idle_workers: 0,
            }),
            non_empty: Condvar::new(),
            non_full: Condvar::new(),
            high: HIGH_WATERMARK * workers,
            low: LOW_WATERMARK * workers,
        }
    }

    /// Enqueue one job, blocking while the queue is above the high mark.
    pub fn push(&self, job: Job) -> Result<PushOutcome, EngineError> {
        let mut inner = self.inner.lock();

        while !(inner.cancelled || inner.splitter_done || inner.jobs.len() < self.high) {
            self.non_full.wait(&mut inner);
        }

        if inner.cancelled {
            return Ok(PushOutcome::Cancelled);
        }
        if inner.splitter_done {
            return Err(EngineError::bug(
                "producer pushed a job after signalling end of input",
            ));
        }

        // Only wake a consumer when one is actually parked.
        if inner.idle_workers > 0 {
            self.non_empty.notify_one();
        }
        inner.jobs.push_back(job);
        Ok(PushOutcome::Pushed)
    }

    /// Dequeue one job, blocking while the queue is empty and the producer
    /// is still running.
    pub fn pop(&self) -> PopOutcome {
        let mut inner = self.inner.lock();
        loop {
            if inner.cancelled {
                return PopOutcome::Cancelled;
            }
            if inner.splitter_done && inner.jobs.is_empty() {
                inner.alive_workers -= 1;
                return PopOutcome::Drained {
                    last_worker: inner.alive_workers == 0,
                };
            }
            if let Some(job) = inner.jobs.pop_front() {
                if inner.jobs.len() <= self.low {
                    self.non_full.notify_one();
                }
                return PopOutcome::Job(job);
            }
            inner.idle_workers += 1;
            self.non_empty.wait(&mut inner);
            inner.idle_workers -= 1;
        }
    }

    /// The producer signals end of input; parked consumers drain and retire.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.splitter_done = true;
        self.non_empty.notify_all();
    }

    /// Cancel the run: wake everything parked on either side.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        inner.cancelled = true;
        self.non_empty.notify_all();
        self.non_full.notify_all();
    }

    /// Current number of queued jobs.
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }

    /// The job count at which `push` blocks.
    pub fn high_mark(&self) -> usize {
        self.high
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
