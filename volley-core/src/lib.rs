//! Core of the volley load harness
//!
//! A run fans `N` tasks out through an [`AdmissionGate`] of width `K`, executes
//! one [`Operation`] per task, folds every outcome into a [`ResultAggregator`],
//! and renders a [`Report`] once the join barrier confirms all tasks finished.
//! The latency-tracking variant pairs asynchronously arriving responses with
//! their requests through a [`CorrelationTable`].

pub mod aggregator;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod operation;
pub mod report;
pub mod runner;
pub mod sink;
pub mod task;

// Re-export commonly used types at the crate root
pub use aggregator::{AggregatorSnapshot, OutcomeRecord, OutcomeStatus, ResultAggregator};
pub use correlation::CorrelationTable;
pub use dispatcher::{CancelHandle, Dispatcher, RunParameters, RunPhase};
pub use error::{ErrorKind, HarnessError, HarnessResult, OperationError};
pub use gate::{AdmissionGate, GateClosed, Permit};
pub use operation::Operation;
pub use report::{LatencyStats, Report, ReportFormat, ResponseStats, Verdict};
pub use runner::{BackgroundRunner, RunHandle};
pub use sink::{deliver_all, deliver_error_all, LogSink, ReportSink, StdoutSink};
pub use task::{Task, TaskFactory, TaskPayload};
