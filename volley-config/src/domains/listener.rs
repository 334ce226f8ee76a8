//! Callback listener configuration

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_port_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Where the correlating callback listener binds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ListenerConfig {
    /// Resolve the configured address into a socket address
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| ConfigError::DomainError {
                domain: self.domain_name().to_string(),
                message: format!("invalid bind address '{}': {}", self.bind_address, e),
            })
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Validatable for ListenerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;
        self.socket_addr()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "listener"
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}
