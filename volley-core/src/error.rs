//! Error types for the load harness
//!
//! Two families: [`OperationError`] is a classified per-task failure that is
//! counted and never propagated; [`HarnessError`] aborts or describes the run
//! itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Aggregation key for per-operation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Constraint,
    Timeout,
    Status,
    Payload,
    Cancelled,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Constraint => "constraint",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Status => "status",
            ErrorKind::Payload => "payload",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation's failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Unexpected response status: {code}")]
    Status { code: u16 },

    #[error("Payload error: {0}")]
    Payload(String),

    #[error("Operation cancelled before admission")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Connection(_) => ErrorKind::Connection,
            OperationError::Constraint(_) => ErrorKind::Constraint,
            OperationError::Timeout(_) => ErrorKind::Timeout,
            OperationError::Status { .. } => ErrorKind::Status,
            OperationError::Payload(_) => ErrorKind::Payload,
            OperationError::Cancelled => ErrorKind::Cancelled,
            OperationError::Other(_) => ErrorKind::Other,
        }
    }
}

/// Failures of the run as a whole
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The target could not be prepared; nothing was dispatched
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Invalid run parameters: {0}")]
    InvalidParameters(String),

    #[error("Callback listener error: {0}")]
    Listener(String),

    #[error("Report delivery failed: {0}")]
    Sink(String),

    #[error("Background run failed: {0}")]
    Join(String),

    #[error("Configuration error: {0}")]
    Config(#[from] volley_config::ConfigError),
}

/// Result type alias for harness-level operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
