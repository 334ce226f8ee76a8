//! Request/response correlation for the latency-tracking variant

use crate::aggregator::ResultAggregator;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Maps a request identifier to the instant its request was issued.
///
/// Entries whose response never arrives stay in the table for the lifetime
/// of the run; there is no expiry.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: Mutex<HashMap<i64, Instant>>,
    emptied: Notify,
    matched: AtomicU64,
    unmatched: AtomicU64,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` was issued at `issued_at`.
    /// Returns the previous timestamp if `id` was already pending.
    pub fn put(&self, id: i64, issued_at: Instant) -> Option<Instant> {
        self.entries.lock().insert(id, issued_at)
    }

    /// Atomically remove and return the entry for `id`, if present.
    /// Other identifiers are never touched.
    pub fn take_if_present(&self, id: i64) -> Option<Instant> {
        let mut entries = self.entries.lock();
        let taken = entries.remove(&id);
        let now_empty = taken.is_some() && entries.is_empty();
        drop(entries);

        match taken {
            Some(_) => {
                self.matched.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
            }
        }
        if now_empty {
            self.emptied.notify_waiters();
        }
        taken
    }

    /// Drop the entry for a request that never reached the target.
    /// Not counted as matched or unmatched.
    pub fn forget(&self, id: i64) {
        let mut entries = self.entries.lock();
        let removed = entries.remove(&id).is_some();
        let now_empty = removed && entries.is_empty();
        drop(entries);

        if now_empty {
            self.emptied.notify_waiters();
        }
    }

    /// Match a response for `id` received at `received_at` and forward its
    /// latency to `aggregator`. Late or duplicate responses return `None`
    /// and leave the aggregator untouched.
    pub fn complete(
        &self,
        id: i64,
        received_at: Instant,
        aggregator: &ResultAggregator,
    ) -> Option<Duration> {
        let issued_at = self.take_if_present(id)?;
        let latency = received_at.saturating_duration_since(issued_at);
        aggregator.record_latency(latency);
        Some(latency)
    }

    /// Requests still awaiting a response
    pub fn pending(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Responses that matched a pending request
    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    /// Responses that arrived with no pending request (late, duplicate, or unknown)
    pub fn unmatched(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// Wait until every pending request has been answered, or `timeout` elapses.
    /// Returns whether the table drained.
    pub async fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.emptied.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.pending() == 0;
            }
        }
    }
}
