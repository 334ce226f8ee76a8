//! HTTP target configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_http_url, validate_positive, validate_required_string, Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the webhook endpoint under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL of the service receiving webhook updates
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Request timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Message text carried by every simulated update
    #[serde(default = "default_message_text")]
    pub message_text: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            message_text: default_message_text(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_http_url(&self.target_url, "target_url", self.domain_name())?;
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

fn default_target_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("volley/{}", env!("CARGO_PKG_VERSION"))
}

fn default_message_text() -> String {
    "/start".to_string()
}
