//! Load run parameters

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters fixed at the start of a load run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total number of operations to issue
    #[serde(default = "default_request_count")]
    pub request_count: u64,

    /// Maximum number of operations in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Seed for the synthetic payload generator
    #[serde(default)]
    pub payload_seed: u64,

    /// Added to every request identifier (identifiers start at `id_offset + 1`)
    #[serde(default)]
    pub id_offset: i64,

    /// Record the wall time of each operation as a latency sample
    #[serde(default = "crate::domains::utils::default_true")]
    pub record_operation_latency: bool,

    /// Number of operation failures logged at warn level before going quiet
    #[serde(default = "default_error_log_limit")]
    pub error_log_limit: u64,

    /// How long to wait for outstanding callbacks after dispatch completes
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_settle_timeout"
    )]
    pub settle_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            request_count: default_request_count(),
            concurrency: default_concurrency(),
            payload_seed: 0,
            id_offset: 0,
            record_operation_latency: true,
            error_log_limit: default_error_log_limit(),
            settle_timeout: default_settle_timeout(),
        }
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.concurrency, "concurrency", self.domain_name())?;

        if self.id_offset < 0 {
            return Err(self.validation_error("id_offset cannot be negative"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}

fn default_request_count() -> u64 {
    2000
}

fn default_concurrency() -> usize {
    15
}

fn default_error_log_limit() -> u64 {
    5
}

fn default_settle_timeout() -> Duration {
    Duration::from_secs(2)
}
