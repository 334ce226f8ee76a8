//! Fan-out of a run's tasks through the admission gate

use crate::aggregator::{OutcomeRecord, ResultAggregator};
use crate::correlation::CorrelationTable;
use crate::error::{ErrorKind, HarnessError, HarnessResult, OperationError};
use crate::gate::AdmissionGate;
use crate::operation::Operation;
use crate::report::{Report, ResponseStats};
use crate::task::{Task, TaskFactory};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use volley_config::RunConfig;

/// Lifecycle of a single run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Dispatching,
    Draining,
    Reporting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Draining => "draining",
            RunPhase::Reporting => "reporting",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fixed inputs of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub request_count: u64,
    pub concurrency: usize,
    pub payload_seed: u64,
    pub id_offset: i64,
    pub record_operation_latency: bool,
    pub error_log_limit: u64,
    pub settle_timeout: Duration,
}

impl RunParameters {
    pub fn new(request_count: u64, concurrency: usize) -> Self {
        Self {
            request_count,
            concurrency,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.concurrency == 0 {
            return Err(HarnessError::InvalidParameters(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.id_offset < 0 {
            return Err(HarnessError::InvalidParameters(
                "id_offset cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunParameters {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for RunParameters {
    fn from(config: &RunConfig) -> Self {
        Self {
            request_count: config.request_count,
            concurrency: config.concurrency,
            payload_seed: config.payload_seed,
            id_offset: config.id_offset,
            record_operation_latency: config.record_operation_latency,
            error_log_limit: config.error_log_limit,
            settle_timeout: config.settle_timeout,
        }
    }
}

/// Stops admitting new operations. Operations already holding a permit finish;
/// the rest are recorded as cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    gate: AdmissionGate,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.gate.is_closed() {
            info!("Cancelling run, closing admission gate");
            self.gate.close();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.is_closed()
    }
}

/// State shared by every spawned task
struct TaskContext {
    gate: AdmissionGate,
    aggregator: Arc<ResultAggregator>,
    operation: Arc<dyn Operation>,
    record_latency: bool,
    error_log_limit: u64,
}

/// Drives one run: spawns `N` tasks, joins them all, then builds the report.
pub struct Dispatcher {
    params: RunParameters,
    factory: TaskFactory,
    gate: AdmissionGate,
    aggregator: Arc<ResultAggregator>,
    correlation: Option<Arc<CorrelationTable>>,
    label: Option<String>,
    phase: watch::Sender<RunPhase>,
}

impl Dispatcher {
    pub fn new(params: RunParameters) -> HarnessResult<Self> {
        params.validate()?;
        let gate = AdmissionGate::new(params.concurrency)?;
        let (phase, _) = watch::channel(RunPhase::Idle);

        Ok(Self {
            factory: TaskFactory::new(params.payload_seed, params.id_offset),
            params,
            gate,
            aggregator: Arc::new(ResultAggregator::new()),
            correlation: None,
            label: None,
            phase,
        })
    }

    pub fn with_aggregator(mut self, aggregator: Arc<ResultAggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Pair callbacks with requests through `table`. Latency samples then come
    /// from matched responses instead of operation wall time.
    pub fn with_correlation(mut self, table: Arc<CorrelationTable>) -> Self {
        self.correlation = Some(table);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn aggregator(&self) -> Arc<ResultAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn phase(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            gate: self.gate.clone(),
        }
    }

    fn advance(&self, next: RunPhase) {
        let moved = self.phase.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if moved {
            debug!("Run phase: {}", next);
        }
    }

    /// Execute the run to completion. Every task produces exactly one outcome,
    /// so `succeeded + errored == request_count` in the returned report.
    pub async fn run(self, operation: Arc<dyn Operation>) -> HarnessResult<Report> {
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| operation.name().to_string());
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            "Starting run {} ({}): {} requests, concurrency {}",
            run_id, label, self.params.request_count, self.params.concurrency
        );

        let context = Arc::new(TaskContext {
            gate: self.gate.clone(),
            aggregator: Arc::clone(&self.aggregator),
            operation,
            record_latency: self.params.record_operation_latency && self.correlation.is_none(),
            error_log_limit: self.params.error_log_limit,
        });

        self.advance(RunPhase::Dispatching);
        let start = Instant::now();
        let mut tasks = JoinSet::new();

        for index in 0..self.params.request_count {
            let task = self.factory.task(index);
            self.aggregator.record_issued();
            tasks.spawn(execute_task(Arc::clone(&context), task));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // A panicking operation still accounts for its task
                let errors = self.aggregator.record_error(ErrorKind::Other);
                log_failure(errors, context.error_log_limit, &format!("task aborted: {}", e));
            }
        }
        let elapsed = start.elapsed();

        // Every permit is back; only late callbacks remain
        self.advance(RunPhase::Draining);
        let responses = match &self.correlation {
            Some(table) => {
                let settled = table.wait_until_empty(self.params.settle_timeout).await;
                if !settled {
                    warn!(
                        "{} responses still outstanding after {:?}",
                        table.pending(),
                        self.params.settle_timeout
                    );
                }
                Some(ResponseStats {
                    matched: table.matched(),
                    pending: table.pending() as u64,
                    unmatched: table.unmatched(),
                })
            }
            None => None,
        };

        self.advance(RunPhase::Reporting);
        let snapshot = self.aggregator.snapshot();
        let report = Report::new(label, &snapshot, elapsed)
            .with_run(run_id, started_at)
            .with_concurrency(self.gate.capacity(), self.gate.peak_in_flight())
            .with_responses(responses);

        info!("Run {} finished. {}", run_id, report.status_line());
        self.advance(RunPhase::Done);

        Ok(report)
    }
}

async fn execute_task(context: Arc<TaskContext>, task: Task) {
    let permit = match context.gate.acquire().await {
        Ok(permit) => permit,
        Err(closed) => {
            let error = OperationError::from(closed);
            context
                .aggregator
                .record_outcome(&OutcomeRecord::error(error.kind(), None));
            debug!("Request {} not admitted: {}", task.request_id, error);
            return;
        }
    };

    let started = Instant::now();
    let result = context.operation.execute(&task).await;
    let latency = context.record_latency.then(|| started.elapsed());

    match result {
        Ok(()) => {
            context
                .aggregator
                .record_outcome(&OutcomeRecord::success(latency));
        }
        Err(error) => {
            let errors = context
                .aggregator
                .record_outcome(&OutcomeRecord::error(error.kind(), latency));
            log_failure(
                errors,
                context.error_log_limit,
                &format!("request {} failed: {}", task.request_id, error),
            );
        }
    }

    permit.release();
}

fn log_failure(errors_so_far: u64, limit: u64, message: &str) {
    if errors_so_far <= limit {
        warn!("Error #{}: {}", errors_so_far, message);
    } else {
        debug!("Error #{}: {}", errors_so_far, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysOk;

    #[async_trait]
    impl Operation for AlwaysOk {
        fn name(&self) -> &str {
            "always-ok"
        }

        async fn execute(&self, _task: &Task) -> Result<(), OperationError> {
            Ok(())
        }
    }

    struct FailEven;

    #[async_trait]
    impl Operation for FailEven {
        fn name(&self) -> &str {
            "fail-even"
        }

        async fn execute(&self, task: &Task) -> Result<(), OperationError> {
            if task.index % 2 == 0 {
                Err(OperationError::Constraint("duplicate key".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Sleeps while tracking how many executions overlap
    struct Tracking {
        current: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl Tracking {
        fn new(delay: Duration) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl Operation for Tracking {
        fn name(&self) -> &str {
            "tracking"
        }

        async fn execute(&self, _task: &Task) -> Result<(), OperationError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanicOnThird;

    #[async_trait]
    impl Operation for PanicOnThird {
        fn name(&self) -> &str {
            "panic"
        }

        async fn execute(&self, task: &Task) -> Result<(), OperationError> {
            if task.index == 3 {
                panic!("operation blew up");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_all_successful() {
        let dispatcher = Dispatcher::new(RunParameters::new(10, 3)).unwrap();
        let report = dispatcher.run(Arc::new(AlwaysOk)).await.unwrap();

        assert_eq!(report.label, "always-ok");
        assert_eq!(report.total_issued, 10);
        assert_eq!(report.succeeded, 10);
        assert_eq!(report.errored, 0);
        assert!(report.peak_in_flight <= 3);
        assert_eq!(report.latency.map(|l| l.count), Some(10));
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_retried() {
        let dispatcher = Dispatcher::new(RunParameters::new(10, 4)).unwrap();
        let report = dispatcher.run(Arc::new(FailEven)).await.unwrap();

        assert_eq!(report.total_issued, 10);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.errored, 5);
        assert_eq!(report.errors_by_kind.get(&ErrorKind::Constraint), Some(&5));
    }

    #[tokio::test]
    async fn test_zero_requests_reports_no_data() {
        let dispatcher = Dispatcher::new(RunParameters::new(0, 5)).unwrap();
        let report = dispatcher.run(Arc::new(AlwaysOk)).await.unwrap();

        assert_eq!(report.total_issued, 0);
        assert_eq!(report.rps, None);
        assert_eq!(report.latency, None);
        assert!(report.render_text().contains("no data"));
    }

    struct FailEveryThird;

    #[async_trait]
    impl Operation for FailEveryThird {
        fn name(&self) -> &str {
            "fail-every-third"
        }

        async fn execute(&self, task: &Task) -> Result<(), OperationError> {
            if (task.index + 1) % 3 == 0 {
                Err(OperationError::Timeout("deadline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_deterministic_failures_sum_to_total() {
        let report = Dispatcher::new(RunParameters::new(50, 5))
            .unwrap()
            .run(Arc::new(FailEveryThird))
            .await
            .unwrap();

        assert_eq!(report.errored, 16);
        assert_eq!(report.succeeded, 34);
        assert_eq!(report.succeeded + report.errored, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_is_serialized_by_capacity() {
        let operation = Arc::new(Tracking::new(Duration::from_millis(10)));
        let report = Dispatcher::new(RunParameters::new(100, 10))
            .unwrap()
            .run(operation.clone())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 100);
        assert_eq!(report.errored, 0);
        assert!(report.elapsed >= Duration::from_millis(100));
        assert!(report.rps.unwrap() <= 1000.0);
        assert_eq!(operation.peak.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Dispatcher::new(RunParameters::new(10, 0));
        assert!(matches!(result, Err(HarnessError::InvalidParameters(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_capacity() {
        let operation = Arc::new(Tracking::new(Duration::from_millis(5)));
        let dispatcher = Dispatcher::new(RunParameters::new(60, 4)).unwrap();
        let report = dispatcher.run(operation.clone()).await.unwrap();

        assert_eq!(report.succeeded, 60);
        assert!(operation.peak.load(Ordering::SeqCst) <= 4);
        assert!(report.peak_in_flight <= 4);
        assert!(report.peak_in_flight >= 1);
    }

    #[tokio::test]
    async fn test_operation_latency_can_be_disabled() {
        let params = RunParameters {
            record_operation_latency: false,
            ..RunParameters::new(5, 2)
        };
        let report = Dispatcher::new(params)
            .unwrap()
            .run(Arc::new(AlwaysOk))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 5);
        assert_eq!(report.latency, None);
    }

    #[tokio::test]
    async fn test_panicking_operation_still_accounted() {
        let dispatcher = Dispatcher::new(RunParameters::new(6, 2)).unwrap();
        let report = dispatcher.run(Arc::new(PanicOnThird)).await.unwrap();

        assert_eq!(report.succeeded, 5);
        assert_eq!(report.errored, 1);
        assert_eq!(report.errors_by_kind.get(&ErrorKind::Other), Some(&1));
    }

    #[tokio::test]
    async fn test_cancel_records_unadmitted_tasks() {
        let dispatcher = Dispatcher::new(RunParameters::new(5, 1)).unwrap();
        let cancel = dispatcher.cancel_handle();
        let operation = Arc::new(Tracking::new(Duration::from_millis(200)));

        let run = tokio::spawn(dispatcher.run(operation));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert!(cancel.is_cancelled());

        let report = run.await.unwrap().unwrap();
        let cancelled = report
            .errors_by_kind
            .get(&ErrorKind::Cancelled)
            .copied()
            .unwrap_or(0);

        assert_eq!(report.succeeded + report.errored, 5);
        assert_eq!(report.succeeded, 1);
        assert_eq!(cancelled, 4);
    }

    #[tokio::test]
    async fn test_phase_moves_forward_to_done() {
        let dispatcher = Dispatcher::new(RunParameters::new(3, 1)).unwrap();
        let phase = dispatcher.phase();
        assert_eq!(*phase.borrow(), RunPhase::Idle);

        dispatcher.run(Arc::new(AlwaysOk)).await.unwrap();
        assert_eq!(*phase.borrow(), RunPhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_draining_starts_after_every_permit_is_returned() {
        let table = Arc::new(CorrelationTable::new());
        table.put(99, Instant::now());

        let params = RunParameters {
            settle_timeout: Duration::from_millis(200),
            ..RunParameters::new(10, 2)
        };
        let dispatcher = Dispatcher::new(params)
            .unwrap()
            .with_correlation(Arc::clone(&table));
        let gate = dispatcher.gate().clone();
        let mut phase = dispatcher.phase();

        let run = tokio::spawn(
            dispatcher.run(Arc::new(Tracking::new(Duration::from_millis(50)))),
        );

        phase
            .wait_for(|p| *p >= RunPhase::Draining)
            .await
            .unwrap();
        assert_eq!(*phase.borrow(), RunPhase::Draining);
        assert_eq!(gate.in_flight(), 0);

        let report = run.await.unwrap().unwrap();
        assert_eq!(report.succeeded, 10);
        assert_eq!(report.responses.unwrap().pending, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_wait_reports_outstanding_responses() {
        let table = Arc::new(CorrelationTable::new());
        table.put(1, Instant::now());

        let params = RunParameters {
            settle_timeout: Duration::from_millis(100),
            ..RunParameters::new(2, 1)
        };
        let report = Dispatcher::new(params)
            .unwrap()
            .with_correlation(Arc::clone(&table))
            .with_label("settle")
            .run(Arc::new(AlwaysOk))
            .await
            .unwrap();

        let responses = report.responses.unwrap();
        assert_eq!(responses.matched, 0);
        assert_eq!(responses.pending, 1);
        // Latency comes from callbacks only when correlating
        assert_eq!(report.latency, None);
    }
}
