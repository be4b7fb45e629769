//! Shared utilities for use cases.
//!
//! Contains cancellation checking and the bounded store call helper used by
//! the workflow coordinator and the stall sweep.

use crate::config::WorkflowParams;
use crate::ports::problem_store::StoreError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::workflow::WorkflowError;

/// Check if cancellation has been requested.
///
/// Returns `Err(WorkflowError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: Option<&CancellationToken>) -> Result<(), WorkflowError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(WorkflowError::Cancelled);
    }
    Ok(())
}

/// Run one store operation under `store_timeout`, retrying transient
/// failures with exponential backoff up to `max_store_retries` times.
///
/// The last error is returned once retries are exhausted.
pub(crate) async fn bounded_store_call<T, F, Fut>(
    params: &WorkflowParams,
    operation: &'static str,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(params.store_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(params.store_timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < params.max_store_retries => {
                let delay = params.backoff_for(attempt);
                attempt += 1;
                warn!(
                    "Store {} failed ({}), retry {}/{} in {:?}",
                    operation, e, attempt, params.max_store_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
