//! Repeated statement execution for rowforge.
//!
//! [`ExecutionEngine`] drives a caller-supplied task across a fixed pool of
//! worker threads until a count or duration budget is spent, isolating
//! per-iteration failures and aggregating them into an [`ExecutionResult`].

pub mod engine;
pub mod errors;
pub mod log;
pub mod options;
pub mod progress;
pub mod result;
pub mod task;

pub use engine::{EngineState, ExecutionEngine, IterationContext};
pub use errors::ExecutionError;
pub use log::{ERROR_LOG_FILE, ErrorLog};
pub use options::{ExecutionOptions, OutputMode, SequenceMode, StopPolicy};
pub use progress::Progress;
pub use result::ExecutionResult;
pub use task::{FileSink, StatementSink, StatementTask, sink_for_output};
