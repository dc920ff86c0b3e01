use thiserror::Error;

/// Errors emitted while producing rows or materializing queries.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid generator: {0}")]
    InvalidGenerator(String),
    #[error("missing reference: {0}")]
    MissingReference(String),
    #[error("unsupported feature: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Core(#[from] rowforge_core::Error),
}
