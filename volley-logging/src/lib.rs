//! Logging setup for volley
//!
//! All crates log through `tracing`; this crate owns the subscriber.

pub mod init;

pub use init::{env_filter_for, init_logging_from_config, init_simple_tracing};
