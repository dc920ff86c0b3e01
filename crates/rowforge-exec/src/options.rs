use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::errors::ExecutionError;

/// When the workers stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopPolicy {
    /// Stop once `target` iterations have started across all workers.
    ///
    /// Best-effort cap: each worker reserves its iteration before the bound is
    /// rechecked, so up to `max_threads - 1` extra iterations may run.
    Count { target: u64 },
    /// Stop starting new iterations once the wall-clock budget is spent.
    /// In-flight iterations finish, so a run can exceed the budget by one
    /// task latency.
    Duration(Duration),
}

/// Where materialized statements go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Execute against the configured data store.
    Execute,
    /// Write `GeneratedScript_<n>.sql` files into `folder`.
    WriteToFile { folder: Option<PathBuf> },
}

/// How sequence numbers are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMode {
    /// One new number per task invocation, shared by all its rows.
    NewPerExecution,
    /// A new number for every row.
    NewPerRow,
    /// The same number for every row of every task.
    Constant(u64),
}

/// Options for one [`crate::ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub stop: StopPolicy,
    pub max_threads: usize,
    pub output: OutputMode,
    pub sequence: SequenceMode,
    /// Directory for the append-only error log; `None` logs through tracing only.
    pub log_dir: Option<PathBuf>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            stop: StopPolicy::Count { target: 100 },
            max_threads: 1,
            output: OutputMode::Execute,
            sequence: SequenceMode::NewPerExecution,
            log_dir: None,
        }
    }
}

impl ExecutionOptions {
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.max_threads == 0 {
            return Err(ExecutionError::Config(
                "max_threads must be at least 1".to_string(),
            ));
        }
        match self.stop {
            StopPolicy::Count { target: 0 } => {
                return Err(ExecutionError::Config(
                    "count target must be at least 1".to_string(),
                ));
            }
            StopPolicy::Duration(duration) if duration.is_zero() => {
                return Err(ExecutionError::Config(
                    "run duration must be positive".to_string(),
                ));
            }
            StopPolicy::Duration(duration) if Instant::now().checked_add(duration).is_none() => {
                return Err(ExecutionError::Config(format!(
                    "run duration of {}s is too large",
                    duration.as_secs()
                )));
            }
            _ => {}
        }
        if let OutputMode::WriteToFile { folder: None } = self.output {
            return Err(ExecutionError::Config(
                "output folder is required when writing to files".to_string(),
            ));
        }
        Ok(())
    }
}
