//! Workflow parameters: coordinator timing control.
//!
//! [`WorkflowParams`] groups the static parameters that bound how long the
//! [`WorkflowCoordinator`](crate::use_cases::workflow::WorkflowCoordinator)
//! may wait on the store and on a contended problem. These are
//! application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator timing parameters.
///
/// | Parameter           | Default | Applies to                       |
/// |---------------------|---------|----------------------------------|
/// | `store_timeout`     | 2 s     | every single store call          |
/// | `max_store_retries` | 2       | transient store failures         |
/// | `retry_backoff`     | 50 ms   | first retry, doubled afterwards  |
/// | `lock_timeout`      | 5 s     | waiting for a busy problem       |
/// | `validation_stall`  | 72 h    | stall sweep (`None` disables)    |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowParams {
    pub store_timeout: Duration,
    pub max_store_retries: u32,
    pub retry_backoff: Duration,
    pub lock_timeout: Duration,
    pub validation_stall: Option<Duration>,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2000),
            max_store_retries: 2,
            retry_backoff: Duration::from_millis(50),
            lock_timeout: Duration::from_millis(5000),
            validation_stall: Some(Duration::from_secs(72 * 3600)),
        }
    }
}

impl WorkflowParams {
    // ==================== Builder Methods ====================

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_max_store_retries(mut self, retries: u32) -> Self {
        self.max_store_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_validation_stall(mut self, stall: Option<Duration>) -> Self {
        self.validation_stall = stall;
        self
    }

    /// Delay before retry number `attempt` (0-based): exponential from `retry_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}
