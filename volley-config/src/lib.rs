//! Domain-driven configuration management for volley
//!
//! Configuration is split by functional domain (run parameters, HTTP target,
//! callback listener, database, notification, logging). Every domain has
//! serde defaults, validation, and `VOLLEY_*` environment overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    database::{DatabaseConfig, Workload},
    http::HttpConfig,
    listener::ListenerConfig,
    logging::LoggingConfig,
    notify::NotifyConfig,
    run::RunConfig,
    VolleyConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
