//! Domain-specific configuration modules

pub mod database;
pub mod http;
pub mod listener;
pub mod logging;
pub mod notify;
pub mod run;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main volley configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VolleyConfig {
    /// Run parameters (request count, concurrency, payload seed)
    #[serde(default)]
    pub run: run::RunConfig,

    /// Webhook target configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Callback listener configuration
    #[serde(default)]
    pub listener: listener::ListenerConfig,

    /// Store target configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Report notification (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<notify::NotifyConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl VolleyConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.run.validate()?;
        self.http.validate()?;
        self.listener.validate()?;
        self.database.validate()?;
        self.logging.validate()?;

        if let Some(ref notify) = self.notify {
            notify.validate()?;
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = VolleyConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
