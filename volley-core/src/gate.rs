//! Admission gate bounding the number of in-flight operations

use crate::error::{HarnessError, HarnessResult, OperationError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Returned by [`AdmissionGate::acquire`] once the gate has been closed
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("admission gate closed")]
pub struct GateClosed;

impl From<GateClosed> for OperationError {
    fn from(_: GateClosed) -> Self {
        OperationError::Cancelled
    }
}

/// Counting semaphore of width `K` with live and peak occupancy counters.
///
/// Cloning is cheap and every clone shares the same permits.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` holders at once
    pub fn new(capacity: usize) -> HarnessResult<Self> {
        if capacity == 0 {
            return Err(HarnessError::InvalidParameters(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(HarnessError::InvalidParameters(format!(
                "concurrency {} exceeds the maximum of {}",
                capacity,
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Wait until fewer than `capacity` permits are outstanding, then take one.
    ///
    /// Returns promptly with [`GateClosed`] once [`close`](Self::close) has been
    /// called, including for callers already waiting.
    pub async fn acquire(&self) -> Result<Permit, GateClosed> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);

        Ok(Permit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Refuse all further admissions and wake every waiter
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of permits ever held at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// Admission token. Returned to the gate when dropped, on every exit path.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Permit {
    /// Return the permit explicitly
    pub fn release(self) {}
}

impl Drop for Permit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the live
        // counter never observes more than `capacity` holders.
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            AdmissionGate::new(0),
            Err(HarnessError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_k_acquisitions_do_not_block() {
        let gate = AdmissionGate::new(3).unwrap();
        let a = gate.acquire().await.unwrap();
        let b = gate.acquire().await.unwrap();
        let c = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 3);
        assert_eq!(gate.peak_in_flight(), 3);
        drop((a, b, c));
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.peak_in_flight(), 3);
    }

    #[tokio::test]
    async fn test_k_plus_one_blocks_until_release() {
        let gate = AdmissionGate::new(1).unwrap();
        let held = gate.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(blocked.is_err(), "second acquire must wait while the permit is held");

        held.release();
        let admitted = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(matches!(admitted, Ok(Ok(_))));
    }

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let gate = AdmissionGate::new(1).unwrap();
        let _held = gate.acquire().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        gate.close();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must return promptly after close")
            .unwrap();
        assert_eq!(result, Err(GateClosed));
        assert!(gate.is_closed());
    }
}
