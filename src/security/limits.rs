//! Concurrent request ceiling.
//!
//! # Responsibilities
//! - Bound the number of proxied requests in flight
//! - Fail fast with 503 instead of queueing when the ceiling is reached
//!
//! # Design Decisions
//! - Semaphore permit held for the lifetime of the request
//! - Only the proxy route is gated; preflight and health stay cheap and always answer

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{RelayError, RelayResult};

/// Admission control for proxied requests.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    /// `None` when the ceiling is disabled.
    permits: Option<Arc<Semaphore>>,
}

impl ConcurrencyLimit {
    /// Create a limit of `max` concurrent requests (0 disables it).
    pub fn new(max: usize) -> Self {
        Self {
            permits: (max > 0).then(|| Arc::new(Semaphore::new(max))),
        }
    }

    /// Try to admit one request without waiting.
    ///
    /// The returned permit must be held until the response is produced.
    pub fn try_acquire(&self) -> RelayResult<Option<OwnedSemaphorePermit>> {
        match &self.permits {
            None => Ok(None),
            Some(sem) => sem
                .clone()
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| RelayError::Overloaded),
        }
    }

    /// Number of requests that can still be admitted, if limited.
    pub fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|s| s.available_permits())
    }
}
