//! HTTP error types

use volley_core::{HarnessError, OperationError};

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Target unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected response status: {0}")]
    Status(u16),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<HttpError> for OperationError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::NetworkError(e) => classify_reqwest(e),
            HttpError::Status(code) => OperationError::Status { code },
            HttpError::InvalidJson(e) => OperationError::Payload(e.to_string()),
            other => OperationError::Other(other.to_string()),
        }
    }
}

impl From<HttpError> for HarnessError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Listener(message) => HarnessError::Listener(message),
            other => HarnessError::Setup(other.to_string()),
        }
    }
}

fn classify_reqwest(error: reqwest::Error) -> OperationError {
    if error.is_timeout() {
        OperationError::Timeout(error.to_string())
    } else if error.is_connect() {
        OperationError::Connection(error.to_string())
    } else if let Some(status) = error.status() {
        OperationError::Status {
            code: status.as_u16(),
        }
    } else if error.is_body() || error.is_decode() {
        OperationError::Payload(error.to_string())
    } else if error.is_request() {
        OperationError::Connection(error.to_string())
    } else {
        OperationError::Other(error.to_string())
    }
}
