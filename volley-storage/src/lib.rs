//! Store side of the volley load harness
//!
//! [`StoreHandle`] owns a connection pool sized to the run's concurrency.
//! [`StoreOperation`] issues one statement per task according to the
//! configured [`Workload`](volley_config::Workload).

pub mod connection;
pub mod error;
pub mod operation;
pub mod queries;

pub use connection::StoreHandle;
pub use error::{StoreError, StoreResult};
pub use operation::StoreOperation;
pub use queries::Backend;
