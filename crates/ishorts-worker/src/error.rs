//! Worker error types.

use thiserror::Error;

use ishorts_models::Stage;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Generation for stage {stage} timed out after {secs}s")]
    GenerationTimeout { stage: Stage, secs: u64 },

    #[error("Invalid generated content: {0}")]
    InvalidContent(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] ishorts_queue::QueueError),

    #[error("Store error: {0}")]
    Store(#[from] ishorts_store::StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] ishorts_llm::LlmError),
}

impl WorkerError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn invalid_content(msg: impl Into<String>) -> Self {
        Self::InvalidContent(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the same task could succeed if an operator re-enqueued it.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::GenerationTimeout { .. } => true,
            WorkerError::Generation(e) => e.is_retryable(),
            WorkerError::Queue(e) => e.is_backend(),
            WorkerError::Store(e) => !e.is_not_found(),
            _ => false,
        }
    }
}
