//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use volley_config::Workload;
use volley_core::ReportFormat;

#[derive(Parser)]
#[command(author, version, about = "Bounded-concurrency load harness", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Overrides shared by both run commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Total number of operations to issue
    #[arg(long, value_name = "N")]
    pub requests: Option<u64>,

    /// Maximum operations in flight
    #[arg(long, value_name = "K")]
    pub concurrency: Option<usize>,

    /// Report format: text, json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: ReportFormat,

    /// Also post the report to the configured chat
    #[arg(long)]
    pub notify: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a webhook endpoint and track callback latency
    Http {
        /// Webhook URL of the system under test
        #[arg(long, value_name = "URL")]
        target_url: Option<String>,

        /// Port for the callback listener
        #[arg(long, value_name = "PORT")]
        listen_port: Option<u16>,

        /// Skip the callback listener and time the POSTs instead
        #[arg(long)]
        no_listener: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Load a database with pooled statements
    Store {
        /// Database URL (sqlite:... or mysql:...)
        #[arg(long, value_name = "URL")]
        database_url: Option<String>,

        /// Statement mix: insert, upsert, lookup, mixed
        #[arg(long, value_name = "WORKLOAD")]
        workload: Option<Workload>,

        /// Do not create missing tables before the run
        #[arg(long)]
        no_bootstrap: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH", default_value = "volley.yaml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
