//! Remote store error types.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user already exists")]
    UserExists,

    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("newer data available on remote storage")]
    OldData,

    #[error("no data")]
    Empty,

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}
