//! Application errors.

use quillpad_core::config::ConfigError;
use quillpad_core::storage::StorageError;
use quillpad_core::surface::SurfaceError;
use thiserror::Error;

/// Errors surfaced by the replay tool.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("Invalid contact script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for the replay tool.
pub type AppResult<T> = Result<T, AppError>;
