//! In-process problem store.
//!
//! Snapshots live in a `BTreeMap` behind a mutex. Nothing survives the
//! process; used by tests and `backend = "memory"`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeladoria_application::ports::problem_store::{ProblemStore, StoreError};
use zeladoria_domain::{Problem, ProblemId};

#[derive(Default)]
struct MemoryState {
    problems: BTreeMap<ProblemId, Problem>,
    last_id: u64,
}

#[derive(Default)]
pub struct MemoryProblemStore {
    state: Mutex<MemoryState>,
}

impl MemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panic mid-update cannot leave a half-written snapshot: every write
        // is a single map insert or remove.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProblemStore for MemoryProblemStore {
    async fn allocate_id(&self) -> Result<ProblemId, StoreError> {
        let mut state = self.state();
        state.last_id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend("problem id space exhausted".into()))?;
        Ok(ProblemId::new(state.last_id))
    }

    async fn get(&self, id: ProblemId) -> Result<Option<Problem>, StoreError> {
        Ok(self.state().problems.get(&id).cloned())
    }

    async fn put(&self, problem: &Problem) -> Result<(), StoreError> {
        let mut state = self.state();
        state.last_id = state.last_id.max(problem.id().value());
        state.problems.insert(problem.id(), problem.clone());
        Ok(())
    }

    async fn delete(&self, id: ProblemId) -> Result<bool, StoreError> {
        Ok(self.state().problems.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        Ok(self.state().problems.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zeladoria_domain::{ActorId, NewProblem};

    fn problem(id: u64) -> Problem {
        let report = NewProblem::new("buraco", "Cratera", -23.55, -46.63).unwrap();
        Problem::report(
            ProblemId::new(id),
            report,
            ActorId::new("maria").unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = MemoryProblemStore::new();
        let first = store.allocate_id().await.unwrap();
        store.put(&problem(first.value())).await.unwrap();
        assert!(store.delete(first).await.unwrap());

        let second = store.allocate_id().await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_put_get_list() {
        let store = MemoryProblemStore::new();
        let first = problem(1);
        store.put(&problem(2)).await.unwrap();
        store.put(&first).await.unwrap();

        assert_eq!(store.get(ProblemId::new(1)).await.unwrap(), Some(first));
        let ids: Vec<_> = store.list().await.unwrap().iter().map(Problem::id).collect();
        assert_eq!(ids, vec![ProblemId::new(1), ProblemId::new(2)]);
        assert!(store.get(ProblemId::new(3)).await.unwrap().is_none());
        assert!(!store.delete(ProblemId::new(3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_advances_allocator() {
        let store = MemoryProblemStore::new();
        store.put(&problem(10)).await.unwrap();
        assert_eq!(store.allocate_id().await.unwrap(), ProblemId::new(11));
    }
}
