//! Running a load test in the background

use crate::dispatcher::{CancelHandle, Dispatcher, RunPhase};
use crate::error::{HarnessError, HarnessResult};
use crate::operation::Operation;
use crate::report::Report;
use crate::sink::{deliver_all, deliver_error_all, ReportSink};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Spawns runs onto the tokio runtime
pub struct BackgroundRunner;

impl BackgroundRunner {
    /// Start `dispatcher` in its own task and deliver the outcome to `sinks`
    /// once it finishes.
    pub fn spawn(
        dispatcher: Dispatcher,
        operation: Arc<dyn Operation>,
        sinks: Vec<Arc<dyn ReportSink>>,
    ) -> RunHandle {
        let id = Uuid::new_v4();
        let phase = dispatcher.phase();
        let cancel = dispatcher.cancel_handle();

        info!("Spawning background run {}", id);
        let handle = tokio::spawn(async move {
            let outcome = dispatcher.run(operation).await;
            match &outcome {
                Ok(report) => {
                    deliver_all(&sinks, report).await;
                }
                Err(e) => {
                    deliver_error_all(&sinks, e).await;
                }
            }
            debug!("Background run {} complete", id);
            outcome
        });

        RunHandle {
            id,
            phase,
            cancel,
            handle,
        }
    }
}

/// Handle to a run started with [`BackgroundRunner::spawn`]
pub struct RunHandle {
    id: Uuid,
    phase: watch::Receiver<RunPhase>,
    cancel: CancelHandle,
    handle: JoinHandle<HarnessResult<Report>>,
}

impl RunHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase of the run
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.clone()
    }

    /// Wait until the run has reached `target` or a later phase
    pub async fn wait_for_phase(&mut self, target: RunPhase) -> RunPhase {
        let reached = match self.phase.wait_for(|phase| *phase >= target).await {
            Ok(phase) => Some(*phase),
            // Sender gone: the run has ended
            Err(_) => None,
        };
        reached.unwrap_or_else(|| *self.phase.borrow())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to finish and return its report
    pub async fn join(self) -> HarnessResult<Report> {
        self.handle
            .await
            .map_err(|e| HarnessError::Join(e.to_string()))?
    }
}
