//! Store error types

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the prediction store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prediction {0} not found")]
    NotFound(String),

    #[error("prediction {0} has already been corrected")]
    AlreadyCorrected(String),

    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<StoreError> for triage_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyCorrected(id) => {
                Self::Conflict(format!("prediction {id} has already been corrected"))
            }
            StoreError::Io(e) => Self::Io(e),
            other => Self::Storage(other.to_string()),
        }
    }
}
