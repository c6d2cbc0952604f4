use bursa_core::CoreError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The id does not resolve. Carries the entity label for messages.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The record exists but belongs to another user.
    #[error("record owned by another user")]
    Forbidden,

    /// A uniqueness rule was hit; the message is client-safe.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => StoreError::Validation(msg),
            other => StoreError::Validation(other.to_string()),
        }
    }
}

/// True when `err` is a UNIQUE/PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
