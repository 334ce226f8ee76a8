//! `volley store`

use super::{apply_run_args, build_sinks, execute, fail_setup, run_parameters};
use crate::cli::RunArgs;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use volley_config::{VolleyConfig, Workload};
use volley_core::{Dispatcher, HarnessError, Operation};
use volley_storage::{StoreHandle, StoreOperation};

pub struct StoreRunOptions {
    pub database_url: Option<String>,
    pub workload: Option<Workload>,
    pub no_bootstrap: bool,
    pub run: RunArgs,
}

pub async fn handle_store(mut config: VolleyConfig, options: StoreRunOptions) -> Result<()> {
    apply_run_args(&mut config, &options.run);
    if let Some(url) = options.database_url {
        config.database.url = url;
    }
    if let Some(workload) = options.workload {
        config.database.workload = workload;
    }
    if options.no_bootstrap {
        config.database.bootstrap_schema = false;
    }
    config.validate_all().context("Invalid configuration")?;

    let sinks = build_sinks(&config, options.run.format, options.run.notify)?;
    let dispatcher = Dispatcher::new(run_parameters(&config)).context("Invalid run parameters")?;

    let store = match prepare_store(&config).await {
        Ok(store) => store,
        Err(e) => return Err(fail_setup(&sinks, e).await),
    };

    let mut operation = StoreOperation::new(store.clone(), config.database.workload);
    if let Some(notify) = &config.notify {
        operation = operation.with_owner(notify.chat_id);
    }
    info!(
        "Workload: {} on {} (pool of {})",
        config.database.workload,
        store.backend(),
        store.pool_size()
    );

    let operation: Arc<dyn Operation> = Arc::new(operation);
    let dispatcher = dispatcher.with_label(format!("store {}", config.database.workload));
    let result = execute(dispatcher, operation, sinks).await;

    store.close().await;
    result.map(|_| ())
}

/// Connect, probe and bootstrap. Any failure here aborts before dispatch.
async fn prepare_store(config: &VolleyConfig) -> Result<StoreHandle, HarnessError> {
    let store = StoreHandle::connect(&config.database, config.run.concurrency).await?;
    store.probe().await?;
    if config.database.bootstrap_schema {
        store.ensure_schema().await?;
    }
    Ok(store)
}
