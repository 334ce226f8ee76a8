//! Report notification configuration

use crate::error::ConfigResult;
use crate::validation::{validate_http_url, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Chat endpoint that receives the finished report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bot token
    pub token: String,

    /// Chat that receives the report
    pub chat_id: i64,
}

impl NotifyConfig {
    /// Endpoint the report is posted to
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

impl Validatable for NotifyConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_http_url(&self.api_base, "api_base", self.domain_name())?;
        validate_required_string(&self.token, "token", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "notify"
    }
}

pub(crate) fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
