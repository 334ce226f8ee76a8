//! Configuration errors

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `VOLLEY_*` override that does not parse
    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error("Domain configuration error in {domain}: {message}")]
    DomainError { domain: String, message: String },
}
