//! Type definitions for the workflow coordinator.

use crate::ports::problem_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeladoria_domain::{DomainError, ProblemId, Rejection, Unauthorized};

/// Errors returned to callers of the workflow coordinator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] Unauthorized),

    #[error("Problem {0} not found")]
    NotFound(ProblemId),

    #[error("Invalid transition: {0}")]
    InvalidTransition(Rejection),

    #[error("Duplicate vote: {0}")]
    DuplicateVote(Rejection),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(StoreError),

    #[error("Store failure: {0}")]
    StoreFailure(StoreError),

    #[error("Action cancelled before commit")]
    Cancelled,
}

/// Coarse classification for callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller's role may never do this.
    Denied,
    /// The problem's state does not allow it; refresh and reconsider.
    Conflict,
    NotFound,
    /// Try again later.
    Transient,
    /// Fix the input.
    Invalid,
    Cancelled,
    /// Needs an operator.
    Internal,
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Unauthorized(_) => ErrorCategory::Denied,
            WorkflowError::InvalidTransition(_) | WorkflowError::DuplicateVote(_) => {
                ErrorCategory::Conflict
            }
            WorkflowError::NotFound(_) => ErrorCategory::NotFound,
            WorkflowError::StoreUnavailable(_) => ErrorCategory::Transient,
            WorkflowError::InvalidInput(_) => ErrorCategory::Invalid,
            WorkflowError::Cancelled => ErrorCategory::Cancelled,
            WorkflowError::StoreFailure(_) => ErrorCategory::Internal,
        }
    }

    /// Only store unavailability is worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::StoreUnavailable(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled)
    }

    /// The caller acted on a stale view and should re-read the problem.
    pub fn requires_resync(&self) -> bool {
        match self {
            WorkflowError::InvalidTransition(rejection)
            | WorkflowError::DuplicateVote(rejection) => rejection.requires_resync(),
            WorkflowError::NotFound(_) => true,
            _ => false,
        }
    }
}

impl From<Rejection> for WorkflowError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::DuplicateVote { .. } => WorkflowError::DuplicateVote(rejection),
            Rejection::EmptyNote => WorkflowError::InvalidInput(rejection.to_string()),
            Rejection::InvalidTransition { .. } | Rejection::QuorumReached { .. } => {
                WorkflowError::InvalidTransition(rejection)
            }
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        if err.is_transient() {
            WorkflowError::StoreUnavailable(err)
        } else {
            WorkflowError::StoreFailure(err)
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        if err.is_corrupt_record() {
            WorkflowError::StoreFailure(StoreError::Corrupt(err))
        } else {
            WorkflowError::InvalidInput(err.to_string())
        }
    }
}
