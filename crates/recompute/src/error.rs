use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecomputeError>;

#[derive(Error, Debug)]
pub enum RecomputeError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::error::StorageError),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ranking parameters: {0}")]
    InvalidParameters(String),
}
