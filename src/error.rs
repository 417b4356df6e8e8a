//! Error type shared by every fallible operation in the crate.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeqGanError>;

#[derive(Debug, Error)]
pub enum SeqGanError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("need at least {required} samples, got {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("empty batch: {0}")]
    EmptyBatch(&'static str),

    #[error("{stage} loss diverged to {value}")]
    NonFiniteLoss { stage: &'static str, value: f32 },

    #[error("checkpoint {}: {message}", path.display())]
    Checkpoint { path: PathBuf, message: String },

    #[error("config file: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reject a NaN or infinite loss before it poisons the optimizer state.
pub(crate) fn ensure_finite(stage: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SeqGanError::NonFiniteLoss { stage, value })
    }
}
