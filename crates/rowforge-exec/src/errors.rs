use thiserror::Error;

use rowforge_generate::GenerationError;

/// Errors raised by the execution layer.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A required option is missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),
    /// `run` was invoked on an engine that already ran.
    #[error("execution engine cannot be reused after a run")]
    Reuse,
    #[error("schema error: {0}")]
    Schema(#[from] rowforge_core::Error),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The statement sink rejected a statement.
    #[error("statement failed: {0}")]
    Statement(String),
}
