use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rowforge_generate::AtomicCounter;

use crate::errors::ExecutionError;
use crate::log::ErrorLog;
use crate::options::{ExecutionOptions, StopPolicy};
use crate::progress::{Progress, ratio_percent};
use crate::result::ExecutionResult;

/// Lifecycle of an engine. Cancellation ends in `Done` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    Running,
    Done,
}

/// Per-iteration view handed to the task.
#[derive(Debug)]
pub struct IterationContext<'a> {
    worker: usize,
    inserts: &'a AtomicCounter,
    cancel: &'a CancellationToken,
}

impl IterationContext<'_> {
    /// Index of the worker running this iteration.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Add `count` to the run's insert counter.
    pub fn record_inserts(&self, count: u64) {
        self.inserts.add(count);
    }

    /// Whether a stop was requested. Long tasks may poll this to bail early.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Single-use engine running a task repeatedly on a fixed worker pool.
///
/// Each worker runs its own copy of the stopping loop; the shared row counter
/// replaces a work queue. Cancellation is cooperative: [`Self::request_stop`]
/// is observed at the next loop check and never interrupts a task that is
/// already running, nor the database or file write inside it.
#[derive(Debug)]
pub struct ExecutionEngine {
    options: ExecutionOptions,
    state: Mutex<EngineState>,
    rows: AtomicCounter,
    inserts: AtomicCounter,
    errors: Mutex<Vec<String>>,
    log: ErrorLog,
    cancel: CancellationToken,
    progress: Arc<Progress>,
}

impl ExecutionEngine {
    /// Validate `options` and open the error log.
    pub fn new(options: ExecutionOptions) -> Result<Self, ExecutionError> {
        options.validate()?;
        let log = match &options.log_dir {
            Some(dir) => ErrorLog::open(dir)?,
            None => ErrorLog::disabled(),
        };

        Ok(Self {
            options,
            state: Mutex::new(EngineState::Created),
            rows: AtomicCounter::new(),
            inserts: AtomicCounter::new(),
            errors: Mutex::new(Vec::new()),
            log,
            cancel: CancellationToken::new(),
            progress: Arc::new(Progress::new()),
        })
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared handle to the advisory percent-complete value.
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    pub fn rows_produced(&self) -> u64 {
        self.rows.peek()
    }

    pub fn inserts(&self) -> u64 {
        self.inserts.peek()
    }

    /// Ask every worker to stop at its next loop check. Safe from any thread
    /// and idempotent.
    pub fn request_stop(&self) {
        if !self.cancel.is_cancelled() {
            info!(event = "stop_requested", rows = self.rows.peek());
        }
        self.cancel.cancel();
    }

    /// Path of the append-only error log, when a log directory was configured.
    pub fn error_log_path(&self) -> Option<&std::path::Path> {
        self.log.path()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `task` until the stopping policy is met or a stop is requested.
    ///
    /// Task errors never make this fail: they are collected into the result's
    /// error list. The only error is [`ExecutionError::Reuse`] for a second
    /// call. A panicking task is recorded and ends only its own worker.
    pub fn run<F, E>(&self, task: F) -> Result<ExecutionResult, ExecutionError>
    where
        F: Fn(&IterationContext<'_>) -> Result<(), E> + Sync,
        E: Display,
    {
        self.begin()?;
        let started = Instant::now();
        info!(
            event = "execution_started",
            policy = ?self.options.stop,
            max_threads = self.options.max_threads,
        );

        let dispatch = match self.options.stop {
            StopPolicy::Count { target } => self.run_count(target, &task),
            StopPolicy::Duration(budget) => self.run_duration(budget, &task),
        };
        if let Err(err) = dispatch {
            self.record_error(format!("execution strategy failed: {err}"));
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = EngineState::Done;

        let errors = std::mem::take(
            &mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let result = ExecutionResult {
            errors,
            insert_count: self.inserts.peek(),
            executed_item_count: self.rows.peek(),
        };

        info!(
            event = "execution_finished",
            executed = result.executed_item_count,
            inserts = result.insert_count,
            errors = result.errors.len(),
            cancelled = self.cancel.is_cancelled(),
            duration_ms = started.elapsed().as_millis() as u64,
        );
        Ok(result)
    }

    fn begin(&self) -> Result<(), ExecutionError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != EngineState::Created {
            return Err(ExecutionError::Reuse);
        }
        *state = EngineState::Running;
        Ok(())
    }

    fn run_count<F, E>(&self, target: u64, task: &F) -> Result<(), ExecutionError>
    where
        F: Fn(&IterationContext<'_>) -> Result<(), E> + Sync,
        E: Display,
    {
        self.spawn_workers(|worker| {
            let ctx = self.context(worker);
            while self.rows.peek() < target && !self.cancel.is_cancelled() {
                self.rows.increment();
                let keep_going = self.run_iteration(&ctx, task);
                let inserts = self.inserts.peek();
                let rows = self.rows.peek();
                self.progress.publish(ratio_percent(rows as f64, target as f64));
                debug!(worker, rows, inserts, "iteration finished");
                if !keep_going {
                    break;
                }
            }
        })
    }

    fn run_duration<F, E>(&self, budget: Duration, task: &F) -> Result<(), ExecutionError>
    where
        F: Fn(&IterationContext<'_>) -> Result<(), E> + Sync,
        E: Display,
    {
        let begin = Instant::now();
        let end = begin.checked_add(budget).ok_or_else(|| {
            ExecutionError::Config(format!("run duration of {}s is too large", budget.as_secs()))
        })?;

        self.spawn_workers(|worker| {
            let ctx = self.context(worker);
            while Instant::now() < end && !self.cancel.is_cancelled() {
                let keep_going = self.run_iteration(&ctx, task);
                self.rows.increment();
                self.progress.publish(ratio_percent(
                    begin.elapsed().as_secs_f64(),
                    budget.as_secs_f64(),
                ));
                if !keep_going {
                    break;
                }
            }
        })
    }

    /// Run `worker_loop` on `max_threads` scoped threads and block until all
    /// of them return.
    fn spawn_workers<W>(&self, worker_loop: W) -> Result<(), ExecutionError>
    where
        W: Fn(usize) + Sync,
    {
        let worker_loop = &worker_loop;
        thread::scope(|scope| -> Result<(), ExecutionError> {
            let mut handles = Vec::with_capacity(self.options.max_threads);
            for worker in 0..self.options.max_threads {
                let handle = thread::Builder::new()
                    .name(format!("rowforge-worker-{worker}"))
                    .spawn_scoped(scope, move || worker_loop(worker))?;
                handles.push(handle);
            }

            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    self.record_error(format!("worker {worker} terminated abnormally"));
                }
            }
            Ok(())
        })
    }

    fn context(&self, worker: usize) -> IterationContext<'_> {
        IterationContext {
            worker,
            inserts: &self.inserts,
            cancel: &self.cancel,
        }
    }

    /// Run one task invocation inside an isolation boundary. Returns `false`
    /// when the task panicked and the worker should stop.
    fn run_iteration<F, E>(&self, ctx: &IterationContext<'_>, task: &F) -> bool
    where
        F: Fn(&IterationContext<'_>) -> Result<(), E> + Sync,
        E: Display,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| task(ctx))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                self.record_error(err.to_string());
                true
            }
            Err(payload) => {
                self.record_error(format!(
                    "worker {} panicked: {}",
                    ctx.worker,
                    panic_message(payload)
                ));
                false
            }
        }
    }

    fn record_error(&self, message: String) {
        warn!(event = "iteration_failed", error = %message);
        self.log.append(&message);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
