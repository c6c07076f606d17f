//! Bounded concurrency for the recursive walk.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of in-flight remote operations across the whole
/// recursive walk. Sibling fan-out multiplies across tree depth, so without a
/// shared limiter worst-case concurrency is unbounded.
#[derive(Clone)]
pub struct TransferLimiter {
    semaphore: Arc<Semaphore>,
}

impl TransferLimiter {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Wait for a transfer slot.
    ///
    /// Permits are held for the duration of a single remote operation, never
    /// across a wait on child tasks, so recursive fan-out cannot deadlock on
    /// the limiter.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("transfer limiter semaphore is never closed")
    }
}
