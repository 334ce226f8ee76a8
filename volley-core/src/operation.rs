//! The seam between the harness and the system under load

use crate::error::OperationError;
use crate::task::Task;
use async_trait::async_trait;

/// Performs exactly one externally visible action per call.
///
/// Implementations must not retry; the dispatcher counts every failure once.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Short label used in logs and reports
    fn name(&self) -> &str;

    async fn execute(&self, task: &Task) -> Result<(), OperationError>;
}
