//! Configuration loading and environment variable handling

use crate::domains::notify::{default_api_base, NotifyConfig};
use crate::domains::VolleyConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "VOLLEY".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<VolleyConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: VolleyConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<VolleyConfig> {
        let mut config = VolleyConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<VolleyConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        self.apply_run_overrides(&mut config.run)?;
        self.apply_http_overrides(config)?;
        self.apply_database_overrides(&mut config.database)?;
        self.apply_notify_overrides(config)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_run_overrides(&self, config: &mut crate::domains::run::RunConfig) -> ConfigResult<()> {
        if let Some(count) = self.parse_env_var("REQUEST_COUNT")? {
            config.request_count = count;
        }

        if let Some(concurrency) = self.parse_env_var("CONCURRENCY")? {
            config.concurrency = concurrency;
        }

        Ok(())
    }

    fn apply_http_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("TARGET_URL") {
            config.http.target_url = url;
        }

        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_TIMEOUT")? {
            config.http.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Some(port) = self.parse_env_var("LISTENER_PORT")? {
            config.listener.port = port;
        }

        Ok(())
    }

    fn apply_database_overrides(
        &self,
        config: &mut crate::domains::database::DatabaseConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        if let Some(max) = self.parse_env_var("DB_MAX_CONNECTIONS")? {
            config.max_connections = Some(max);
        }

        if let Some(workload) = self.parse_env_var("WORKLOAD")? {
            config.workload = workload;
        }

        Ok(())
    }

    /// A token in the environment enables notification even without a config section
    fn apply_notify_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        let token = self.get_env_var("NOTIFY_TOKEN").ok();
        let chat_id: Option<i64> = self.parse_env_var("NOTIFY_CHAT_ID")?;

        match (config.notify.as_mut(), token) {
            (Some(notify), token) => {
                if let Some(token) = token {
                    notify.token = token;
                }
                if let Some(chat_id) = chat_id {
                    notify.chat_id = chat_id;
                }
            }
            (None, Some(token)) => {
                let chat_id = chat_id.ok_or_else(|| {
                    ConfigError::EnvError(format!(
                        "{}_NOTIFY_CHAT_ID is required when {}_NOTIFY_TOKEN is set",
                        self.prefix, self.prefix
                    ))
                })?;
                config.notify = Some(NotifyConfig {
                    api_base: default_api_base(),
                    token,
                    chat_id,
                });
            }
            (None, None) => {}
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Some(level) = self.parse_env_var("LOG_LEVEL")? {
            config.level = level;
        }

        if let Some(format) = self.parse_env_var("LOG_FORMAT")? {
            config.format = format;
        }

        Ok(())
    }

    /// Parse a prefixed environment variable if it is set
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw.parse::<T>().map(Some).map_err(|e| {
                ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))
            }),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
