//! Statement executor

use crate::connection::StoreHandle;
use crate::error::StoreError;
use async_trait::async_trait;
use volley_config::Workload;
use volley_core::{Operation, OperationError, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement {
    InsertTransaction,
    UpsertUser,
    LookupUser,
}

fn statement_for(workload: Workload, index: u64) -> Statement {
    match workload {
        Workload::Insert => Statement::InsertTransaction,
        Workload::Upsert => Statement::UpsertUser,
        Workload::Lookup => Statement::LookupUser,
        Workload::Mixed if index % 2 == 0 => Statement::UpsertUser,
        Workload::Mixed => Statement::LookupUser,
    }
}

/// Issues one statement per task against the pooled store
#[derive(Debug, Clone)]
pub struct StoreOperation {
    store: StoreHandle,
    workload: Workload,
    owner_id: Option<i64>,
}

impl StoreOperation {
    pub fn new(store: StoreHandle, workload: Workload) -> Self {
        Self {
            store,
            workload,
            owner_id: None,
        }
    }

    /// Attribute every inserted transaction to one user instead of the task's
    /// request id
    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }

    async fn run(&self, task: &Task) -> Result<(), StoreError> {
        let backend = self.store.backend();
        let pool = self.store.pool();

        match statement_for(self.workload, task.index) {
            Statement::InsertTransaction => {
                sqlx::query(backend.insert_transaction())
                    .bind(self.owner_id.unwrap_or(task.request_id))
                    .bind(task.payload.amount)
                    .bind(task.payload.description.as_str())
                    .execute(pool)
                    .await?;
            }
            Statement::UpsertUser => {
                sqlx::query(backend.upsert_user())
                    .bind(task.request_id)
                    .bind(format!("user_{}", task.request_id))
                    .bind(task.payload.amount / 100.0)
                    .execute(pool)
                    .await?;
            }
            Statement::LookupUser => {
                // A missing row is a valid answer
                sqlx::query(backend.lookup_user())
                    .bind(task.request_id)
                    .fetch_optional(pool)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Operation for StoreOperation {
    fn name(&self) -> &str {
        self.workload.as_str()
    }

    async fn execute(&self, task: &Task) -> Result<(), OperationError> {
        self.run(task).await.map_err(OperationError::from)
    }
}
