//! Per-problem mutual exclusion.
//!
//! Actions on the same problem are serialized through one async mutex per
//! problem id; actions on different problems never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use zeladoria_domain::ProblemId;

/// Entries with no holder or waiter are dropped once the map grows past this.
const PRUNE_THRESHOLD: usize = 256;

#[derive(Default)]
pub(crate) struct ProblemLocks {
    inner: Mutex<HashMap<ProblemId, Arc<AsyncMutex<()>>>>,
}

impl ProblemLocks {
    /// Wait up to `timeout` for exclusive access to `id`.
    ///
    /// Returns `None` if the wait timed out.
    pub(crate) async fn acquire(
        &self,
        id: ProblemId,
        timeout: Duration,
    ) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() > PRUNE_THRESHOLD {
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(map.entry(id).or_default())
        };
        tokio::time::timeout(timeout, lock.lock_owned()).await.ok()
    }

    /// Drop the entry for a deleted problem.
    pub(crate) fn forget(&self, id: ProblemId) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = map.get(&id)
            && Arc::strong_count(lock) == 1
        {
            map.remove(&id);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
