//! Thread-safe aggregation of task outcomes

use crate::error::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Whether an operation succeeded, and if not, how it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Error(ErrorKind),
}

/// Produced exactly once per task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub status: OutcomeStatus,
    pub latency: Option<Duration>,
}

impl OutcomeRecord {
    pub fn success(latency: Option<Duration>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            latency,
        }
    }

    pub fn error(kind: ErrorKind, latency: Option<Duration>) -> Self {
        Self {
            status: OutcomeStatus::Error(kind),
            latency,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }
}

#[derive(Debug, Default)]
struct AggregatorState {
    total_issued: u64,
    success_count: u64,
    error_count: u64,
    errors_by_kind: BTreeMap<ErrorKind, u64>,
    latencies: Vec<Duration>,
}

/// Counters and latency samples shared by every task of a run.
///
/// All mutations go through one lock, so any reader sees
/// `success_count + error_count <= total_issued`.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    state: Mutex<AggregatorState>,
}

/// Consistent copy of the aggregator state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatorSnapshot {
    pub total_issued: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
    #[serde(skip)]
    pub latencies: Vec<Duration>,
}

impl AggregatorSnapshot {
    /// Operations that have produced an outcome
    pub fn completed(&self) -> u64 {
        self.success_count + self.error_count
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a task as issued. Called before the task can record an outcome.
    pub fn record_issued(&self) {
        self.state.lock().total_issued += 1;
    }

    pub fn record_success(&self) {
        self.state.lock().success_count += 1;
    }

    /// Count a failure and return the number of failures so far
    pub fn record_error(&self, kind: ErrorKind) -> u64 {
        let mut state = self.state.lock();
        state.error_count += 1;
        *state.errors_by_kind.entry(kind).or_insert(0) += 1;
        state.error_count
    }

    pub fn record_latency(&self, latency: Duration) {
        self.state.lock().latencies.push(latency);
    }

    /// Fold a whole outcome in under a single lock acquisition.
    /// Returns the failure count after recording.
    pub fn record_outcome(&self, outcome: &OutcomeRecord) -> u64 {
        let mut state = self.state.lock();
        match outcome.status {
            OutcomeStatus::Success => state.success_count += 1,
            OutcomeStatus::Error(kind) => {
                state.error_count += 1;
                *state.errors_by_kind.entry(kind).or_insert(0) += 1;
            }
        }
        if let Some(latency) = outcome.latency {
            state.latencies.push(latency);
        }
        state.error_count
    }

    pub fn snapshot(&self) -> AggregatorSnapshot {
        let state = self.state.lock();
        AggregatorSnapshot {
            total_issued: state.total_issued,
            success_count: state.success_count,
            error_count: state.error_count,
            errors_by_kind: state.errors_by_kind.clone(),
            latencies: state.latencies.clone(),
        }
    }
}
