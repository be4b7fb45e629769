//! Problem store port
//!
//! Defines the interface for persisting problem snapshots. Adapters only
//! store and return whole snapshots; every lifecycle decision is made by the
//! consensus engine before `put` is called.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use zeladoria_domain::{DomainError, Problem, ProblemId};

/// Errors raised by a problem store adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[from] DomainError),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Persistence gateway for problems.
///
/// Implementations must make `put` atomic: either the whole snapshot
/// (status, counters, voter sets, note) is visible afterwards or none of it.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Reserve a fresh identifier. Identifiers are never reused.
    async fn allocate_id(&self) -> Result<ProblemId, StoreError>;

    async fn get(&self, id: ProblemId) -> Result<Option<Problem>, StoreError>;

    /// Insert or replace the snapshot for `problem.id()`.
    async fn put(&self, problem: &Problem) -> Result<(), StoreError>;

    /// Remove a problem. Returns whether it existed.
    async fn delete(&self, id: ProblemId) -> Result<bool, StoreError>;

    /// All problems, ordered by id.
    async fn list(&self) -> Result<Vec<Problem>, StoreError>;
}
