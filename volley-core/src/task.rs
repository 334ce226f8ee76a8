//! Units of work and their synthetic payloads

use serde::Serialize;

/// One unit of work, owned by the task executing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Position in the run, `0..N`
    pub index: u64,
    /// Identifier carried on the wire and used as the correlation key
    pub request_id: i64,
    pub payload: TaskPayload,
}

/// Synthetic data derived from the task index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPayload {
    /// Pseudo-random amount in `[0, 10000)`, two decimal places
    pub amount: f64,
    pub description: String,
}

/// Derives tasks deterministically from `(seed, index)`
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFactory {
    seed: u64,
    id_offset: i64,
}

impl TaskFactory {
    pub fn new(seed: u64, id_offset: i64) -> Self {
        Self { seed, id_offset }
    }

    pub fn task(&self, index: u64) -> Task {
        let mut rng = fastrand::Rng::with_seed(self.seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let amount = (rng.f64() * 1_000_000.0).floor() / 100.0;

        Task {
            index,
            request_id: self
                .id_offset
                .saturating_add(i64::try_from(index).unwrap_or(i64::MAX))
                .saturating_add(1),
            payload: TaskPayload {
                amount,
                description: format!("volley txn {}", index),
            },
        }
    }
}
