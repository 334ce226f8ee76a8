use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use volley_config::domains::logging::LogLevel;
use volley_config::{ConfigLoader, LoggingConfig};
use volley_logging::{init_logging_from_config, init_simple_tracing};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{handle_config_generate, handle_config_show, handle_config_validate};
use commands::http::{handle_http, HttpRunOptions};
use commands::store::{handle_store, StoreRunOptions};

/// Initialize logging from configuration, with the CLI level taking precedence
fn init_logging(mut config: LoggingConfig, log_level: Option<&str>) -> Result<()> {
    if let Some(level) = log_level {
        match level.parse::<LogLevel>() {
            Ok(level) => config.level = level,
            Err(_) => return init_simple_tracing(level),
        }
    }

    if let Err(e) = init_logging_from_config(&config) {
        eprintln!(
            "Failed to initialize structured logging: {}, falling back to simple tracing",
            e
        );
        init_simple_tracing(log_level.unwrap_or("info"))?;
    }

    debug!("Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = ConfigLoader::new().load(cli.config.as_ref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    init_logging(logging, cli.log_level.as_deref())?;

    info!("Volley {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Http {
            target_url,
            listen_port,
            no_listener,
            run,
        }) => {
            let config = loaded.context("Failed to load configuration")?;
            handle_http(
                config,
                HttpRunOptions {
                    target_url,
                    listen_port,
                    no_listener,
                    run,
                },
            )
            .await
        }
        Some(Commands::Store {
            database_url,
            workload,
            no_bootstrap,
            run,
        }) => {
            let config = loaded.context("Failed to load configuration")?;
            handle_store(
                config,
                StoreRunOptions {
                    database_url,
                    workload,
                    no_bootstrap,
                    run,
                },
            )
            .await
        }
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(&config_file),
            ConfigCommands::Generate { output, force } => handle_config_generate(&output, force),
            ConfigCommands::Show { format } => {
                let config = loaded.context("Failed to load configuration")?;
                handle_config_show(&config, &format)
            }
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
