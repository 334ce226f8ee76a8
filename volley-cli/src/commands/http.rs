//! `volley http`

use super::{apply_run_args, build_sinks, execute, fail_setup, run_parameters};
use crate::cli::RunArgs;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use volley_config::VolleyConfig;
use volley_core::{CorrelationTable, Dispatcher, HarnessError, Operation};
use volley_http::{CallbackListener, WebhookOperation};

pub struct HttpRunOptions {
    pub target_url: Option<String>,
    pub listen_port: Option<u16>,
    pub no_listener: bool,
    pub run: RunArgs,
}

pub async fn handle_http(mut config: VolleyConfig, options: HttpRunOptions) -> Result<()> {
    apply_run_args(&mut config, &options.run);
    if let Some(url) = options.target_url {
        config.http.target_url = url;
    }
    if let Some(port) = options.listen_port {
        config.listener.port = port;
    }
    config.validate_all().context("Invalid configuration")?;

    let sinks = build_sinks(&config, options.run.format, options.run.notify)?;

    let dispatcher = Dispatcher::new(run_parameters(&config)).context("Invalid run parameters")?;
    let mut operation = match WebhookOperation::new(&config.http) {
        Ok(operation) => operation,
        Err(e) => return Err(fail_setup(&sinks, HarnessError::from(e)).await),
    };
    if let Err(e) = operation.probe().await {
        return Err(fail_setup(&sinks, HarnessError::from(e)).await);
    }

    let (dispatcher, listener) = if options.no_listener {
        (dispatcher.with_label("webhook"), None)
    } else {
        let table = Arc::new(CorrelationTable::new());
        let addr = config
            .listener
            .socket_addr()
            .context("Invalid listener address")?;

        let aggregator = dispatcher.aggregator();
        let listener = match CallbackListener::bind(addr, Arc::clone(&table), aggregator).await {
            Ok(listener) => listener,
            Err(e) => return Err(fail_setup(&sinks, HarnessError::from(e)).await),
        };
        operation = operation.with_correlation(Arc::clone(&table));
        (
            dispatcher.with_correlation(table).with_label("webhook+callback"),
            Some(listener),
        )
    };

    info!("Target: {}", operation.target());
    let operation: Arc<dyn Operation> = Arc::new(operation);
    let result = execute(dispatcher, operation, sinks).await;

    if let Some(listener) = listener {
        listener
            .shutdown()
            .await
            .context("Failed to stop callback listener")?;
    }

    result.map(|_| ())
}
