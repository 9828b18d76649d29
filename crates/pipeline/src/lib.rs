//! Dmsift - Pipeline
//!
//! The parallel engine that turns a stream of concatenated records into
//! strictly ordered output.
//!
//! # Architecture
//!
//! ```text
//! [inputs] → Splitter → JobQueue → Extractor workers → InOrderExecutor → [output]
//!  (bytes)   (1 thread)  (bounded)     (N threads)        (1 thread)
//! ```
//!
//! - The **splitter** lexes the byte stream into record strings and assigns
//!   each a dense sequence number.
//! - The **job queue** is a bounded FIFO with high/low watermarks; the
//!   splitter stalls above the high mark and resumes at the low mark.
//! - Each **extractor** parses one record into a tree, walks the configured
//!   action pipeline, and submits exactly one deferred output task.
//! - The **in-order executor** buffers tasks in a min-heap keyed by sequence
//!   number and runs them in contiguous ascending order on a single thread,
//!   so output - and all cross-record state the tasks mutate - is identical
//!   to a sequential run regardless of worker count.
//!
//! The [`Supervisor`] sequences startup, the drain handoffs between stages,
//! and error-propagated teardown. Any component error cancels every other
//! component cooperatively; no thread is left blocked.
//!
//! The engine is generic over the executor-side context type `C`: deferred
//! tasks receive `&mut C`, which is how actions reach the output sink and
//! any cross-record bookkeeping without locks.

mod action;
mod engine;
mod error;
mod executor;
mod queue;
mod scanner;
mod splitter;
mod supervisor;

pub use action::{ActionPipeline, RecordAction};
pub use engine::Engine;
pub use error::EngineError;
pub use executor::{InOrderExecutor, SubmitHandle, Task};
pub use queue::{JobQueue, PopOutcome, PushOutcome, HIGH_WATERMARK, LOW_WATERMARK};
pub use scanner::{RawRecord, RecordScanner};
pub use splitter::InputSource;
pub use supervisor::{RunPhase, Supervisor};

/// Default number of extractor worker threads.
pub const DEFAULT_WORKER_THREADS: usize = 16;

/// Hard upper bound on extractor worker threads.
pub const MAX_WORKER_THREADS: usize = 256;
