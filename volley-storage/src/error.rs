//! Storage error types

use sqlx::error::ErrorKind as DbErrorKind;
use thiserror::Error;
use volley_core::{HarnessError, OperationError};

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unsupported database URL: {0}")]
    UnsupportedBackend(String),

    #[error("Schema bootstrap failed: {0}")]
    SchemaFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StoreError> for OperationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Database(e) => classify(e),
            other => OperationError::Other(other.to_string()),
        }
    }
}

impl From<StoreError> for HarnessError {
    fn from(error: StoreError) -> Self {
        HarnessError::Setup(error.to_string())
    }
}

fn classify(error: sqlx::Error) -> OperationError {
    match error {
        sqlx::Error::Database(db) => match db.kind() {
            DbErrorKind::UniqueViolation
            | DbErrorKind::ForeignKeyViolation
            | DbErrorKind::NotNullViolation
            | DbErrorKind::CheckViolation => OperationError::Constraint(db.message().to_string()),
            _ => OperationError::Other(db.message().to_string()),
        },
        sqlx::Error::PoolTimedOut => OperationError::Timeout("pool acquire timed out".to_string()),
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed) => OperationError::Connection(e.to_string()),
        e @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::Encode(_)) => {
            OperationError::Payload(e.to_string())
        }
        other => OperationError::Other(other.to_string()),
    }
}
