//! Subcommand handlers

pub mod config;
pub mod http;
pub mod store;

use crate::cli::RunArgs;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;
use volley_config::VolleyConfig;
use volley_core::{
    deliver_error_all, BackgroundRunner, Dispatcher, HarnessError, LogSink, Operation, Report,
    ReportFormat, ReportSink, RunParameters, StdoutSink,
};
use volley_http::ChatNotifier;

/// Fold the shared run flags into the loaded configuration
pub(crate) fn apply_run_args(config: &mut VolleyConfig, args: &RunArgs) {
    if let Some(requests) = args.requests {
        config.run.request_count = requests;
    }
    if let Some(concurrency) = args.concurrency {
        config.run.concurrency = concurrency;
    }
}

/// Stdout and log sinks, plus the chat notifier when requested
pub(crate) fn build_sinks(
    config: &VolleyConfig,
    format: ReportFormat,
    notify: bool,
) -> Result<Vec<Arc<dyn ReportSink>>> {
    let mut sinks: Vec<Arc<dyn ReportSink>> =
        vec![Arc::new(StdoutSink::new(format)), Arc::new(LogSink)];

    if notify {
        let notify_config = config
            .notify
            .as_ref()
            .context(
                "--notify requires a notify section or VOLLEY_NOTIFY_TOKEN and VOLLEY_NOTIFY_CHAT_ID",
            )?;
        let notifier = ChatNotifier::new(notify_config, &config.http)
            .context("Failed to create chat notifier")?;
        sinks.push(Arc::new(notifier));
    }

    Ok(sinks)
}

pub(crate) fn run_parameters(config: &VolleyConfig) -> RunParameters {
    RunParameters::from(&config.run)
}

/// Report a setup failure to every sink and turn it into the command's error
pub(crate) async fn fail_setup(sinks: &[Arc<dyn ReportSink>], error: HarnessError) -> anyhow::Error {
    deliver_error_all(sinks, &error).await;
    anyhow::Error::new(error)
}

/// Run in the background, cancel on Ctrl+C, and wait for the report
pub(crate) async fn execute(
    dispatcher: Dispatcher,
    operation: Arc<dyn Operation>,
    sinks: Vec<Arc<dyn ReportSink>>,
) -> Result<Report> {
    let cancel = dispatcher.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, letting in-flight operations finish");
            cancel.cancel();
        }
    });

    let handle = BackgroundRunner::spawn(dispatcher, operation, sinks);
    let outcome = handle.join().await;
    interrupt.abort();

    outcome.context("Load run failed")
}
