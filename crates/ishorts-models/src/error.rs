//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown video status: {0}")]
    UnknownStatus(String),

    #[error("Invalid scene set: {0}")]
    InvalidSceneSet(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl ModelError {
    pub fn invalid_scene_set(msg: impl Into<String>) -> Self {
        Self::InvalidSceneSet(msg.into())
    }
}
