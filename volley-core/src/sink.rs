//! Report delivery

use crate::error::{HarnessError, HarnessResult};
use crate::report::{Report, ReportFormat};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// Destination for a finished report
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, report: &Report) -> HarnessResult<()>;

    /// Called instead of [`deliver`](Self::deliver) when the run failed
    async fn deliver_error(&self, _error: &HarnessError) -> HarnessResult<()> {
        Ok(())
    }
}

/// Writes the rendered report to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    format: ReportFormat,
}

impl StdoutSink {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl ReportSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&self, report: &Report) -> HarnessResult<()> {
        let mut rendered = report.render(self.format)?;
        rendered.push('\n');

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(rendered.as_bytes())
            .await
            .map_err(|e| HarnessError::Sink(format!("stdout: {}", e)))?;
        stdout
            .flush()
            .await
            .map_err(|e| HarnessError::Sink(format!("stdout: {}", e)))
    }
}

/// Emits the status line through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, report: &Report) -> HarnessResult<()> {
        info!(
            run_id = %report.run_id,
            label = %report.label,
            "{}",
            report.status_line()
        );
        Ok(())
    }

    async fn deliver_error(&self, failure: &HarnessError) -> HarnessResult<()> {
        error!("Run failed: {}", failure);
        Ok(())
    }
}

/// Hand the report to every sink. A failing sink is logged and does not stop
/// the others. Returns the number of failed deliveries.
pub async fn deliver_all(sinks: &[Arc<dyn ReportSink>], report: &Report) -> usize {
    let mut failures = 0;
    for sink in sinks {
        if let Err(e) = sink.deliver(report).await {
            warn!("Report sink '{}' failed: {}", sink.name(), e);
            failures += 1;
        }
    }
    failures
}

/// Like [`deliver_all`], for a run that ended in an error
pub async fn deliver_error_all(sinks: &[Arc<dyn ReportSink>], failure: &HarnessError) -> usize {
    let mut failures = 0;
    for sink in sinks {
        if let Err(e) = sink.deliver_error(failure).await {
            warn!("Report sink '{}' failed: {}", sink.name(), e);
            failures += 1;
        }
    }
    failures
}
