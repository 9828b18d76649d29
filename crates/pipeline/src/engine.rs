//! Engine - owns the threads and drives the run to completion
//!
//! `Engine::run` spawns one splitter, N extractor workers and one executor,
//! then services the supervisor state machine from the calling thread:
//!
//! - `SplitterDone`: join the splitter, then tell the queue so parked
//!   workers can drain and retire.
//! - `ExtractorsDone`: join the workers, then tell the executor no further
//!   tasks will arrive.
//! - `ExecutorDone`: join the executor and hand the context back.
//! - `Failed`: cancel the queue and the executor, join whatever is still
//!   running, and return the stored error.
//!
//! The stage handoffs go through the main thread on purpose: a stage is
//! only told its producer retired after that producer's thread has actually
//! been joined.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use dmsift_record::{Job, Packet};
use tracing::info;

use crate::action::ActionPipeline;
use crate::executor::InOrderExecutor;
use crate::queue::{JobQueue, PopOutcome};
use crate::splitter::{run_splitter, InputSource};
use crate::supervisor::{RunPhase, Supervisor};
use crate::{EngineError, MAX_WORKER_THREADS};

/// A configured run: inputs, worker count, action pipeline and the context
/// value the executor threads through every task.
pub struct Engine<C: Send + 'static> {
    workers: usize,
    inputs: Vec<InputSource>,
    pipeline: ActionPipeline<C>,
    context: C,
}

impl<C: Send + 'static> Engine<C> {
    /// Configure a run.
    ///
    /// `workers` is the extractor thread count, `1..=256`.
    pub fn new(
        workers: usize,
        inputs: Vec<InputSource>,
        pipeline: ActionPipeline<C>,
        context: C,
    ) -> Result<Self, EngineError> {
        if workers == 0 || workers > MAX_WORKER_THREADS {
            return Err(EngineError::argument(format!(
                "invalid thread number {workers}, it should be between 1 and {MAX_WORKER_THREADS}"
            )));
        }
        Ok(Self {
            workers,
            inputs,
            pipeline,
            context,
        })
    }

    /// Run to completion. Returns the context on success so the caller can
    /// finalize it (flush buffers, drain windows).
    pub fn run(self) -> Result<C, EngineError> {
        let supervisor = Arc::new(Supervisor::new());
        let queue = Arc::new(JobQueue::new(self.workers));
        let executor: InOrderExecutor<C> = InOrderExecutor::new();
        let pipeline = Arc::new(self.pipeline);

        info!(workers = self.workers, inputs = self.inputs.len(), "starting run");

        let mut splitter_handle = Some(spawn_thread("splitter", {
            let queue = Arc::clone(&queue);
            let supervisor = Arc::clone(&supervisor);
            let inputs = self.inputs;
            move || {
                if let Err(e) = run_splitter(inputs, &queue, &supervisor) {
                    supervisor.report_error(e);
                }
            }
        })?);

        let mut worker_handles = Vec::with_capacity(self.workers);
        for i in 0..self.workers {
            worker_handles.push(spawn_thread(&format!("extractor-{i}"), {
                let queue = Arc::clone(&queue);
                let supervisor = Arc::clone(&supervisor);
                let pipeline = Arc::clone(&pipeline);
                let executor = executor.clone();
                move || {
                    if let Err(e) = run_worker(&queue, &pipeline, &executor, &supervisor) {
                        supervisor.report_error(e);
                    }
                }
            })?);
        }

        let mut executor_handle = Some(spawn_thread("executor", {
            let executor = executor.clone();
            let supervisor = Arc::clone(&supervisor);
            let context = self.context;
            move || executor.run(context, &supervisor)
        })?);

        supervisor.start_running();

        let mut phase = RunPhase::Running;
        loop {
            phase = supervisor.wait_while_phase(phase);
            match phase {
                RunPhase::SplitterDone => {
                    join_unit(&mut splitter_handle, &supervisor);
                    queue.finish();
                }
                RunPhase::ExtractorsDone => {
                    join_workers(&mut worker_handles, &supervisor);
                    executor.finish();
                }
                RunPhase::ExecutorDone => {
                    let context = join_executor(&mut executor_handle, &supervisor);
                    // A join panic can flip the phase to Failed even here.
                    return match supervisor.take_error() {
                        None => {
                            info!("run complete");
                            context.ok_or_else(|| {
                                EngineError::bug("executor context lost at shutdown")
                            })
                        }
                        Some(err) => Err(err),
                    };
                }
                RunPhase::Failed => {
                    queue.cancel();
                    executor.cancel();
                    join_unit(&mut splitter_handle, &supervisor);
                    join_workers(&mut worker_handles, &supervisor);
                    join_executor(&mut executor_handle, &supervisor);
                    return Err(supervisor.take_error().unwrap_or_else(|| {
                        EngineError::bug(
                            "run failed but no component stored an error",
                        )
                    }));
                }
                // Intermediate phases with no handoff work.
                _ => {}
            }
        }
    }
}

/// Worker thread body: pop, parse, dispatch, repeat.
fn run_worker<C: Send + 'static>(
    queue: &JobQueue,
    pipeline: &ActionPipeline<C>,
    executor: &InOrderExecutor<C>,
    supervisor: &Supervisor,
) -> Result<(), EngineError> {
    loop {
        match queue.pop() {
            PopOutcome::Cancelled => return Ok(()),
            PopOutcome::Drained { last_worker } => {
                if last_worker {
                    supervisor.extractors_finished()?;
                }
                return Ok(());
            }
            PopOutcome::Job(job) => {
                let submit = executor.handle(job.seq);
                let packet = Packet::parse(&job.text).map_err(|e| parse_error(&job, e))?;
                pipeline.dispatch(packet, job, submit)?;
            }
        }
    }
}

fn parse_error(job: &Job, err: dmsift_record::RecordError) -> EngineError {
    EngineError::Parse {
        file: job.source_name.clone(),
        start_line: job.start_line,
        end_line: job.end_line,
        message: err.to_string(),
    }
}

fn spawn_thread<T: Send + 'static>(
    name: &str,
    body: impl FnOnce() -> T + Send + 'static,
) -> Result<JoinHandle<T>, EngineError> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(EngineError::from)
}

fn join_unit(handle: &mut Option<JoinHandle<()>>, supervisor: &Supervisor) {
    if let Some(h) = handle.take() {
        if h.join().is_err() {
            supervisor.report_error(EngineError::bug("splitter thread panicked"));
        }
    }
}

fn join_workers(handles: &mut Vec<JoinHandle<()>>, supervisor: &Supervisor) {
    for h in handles.drain(..) {
        if h.join().is_err() {
            supervisor.report_error(EngineError::bug("extractor thread panicked"));
        }
    }
}

fn join_executor<C>(
    handle: &mut Option<JoinHandle<C>>,
    supervisor: &Supervisor,
) -> Option<C> {
    let h = handle.take()?;
    match h.join() {
        Ok(context) => Some(context),
        Err(_) => {
            supervisor.report_error(EngineError::bug("executor thread panicked"));
            None
        }
    }
}
