//! Reasons the consensus engine refuses a transition.

use crate::access::ActionKind;
use crate::problem::{ActorId, ProblemStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which vote a duplicate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePhase {
    Confirmation,
    Validation,
}

impl fmt::Display for VotePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotePhase::Confirmation => write!(f, "confirmed"),
            VotePhase::Validation => write!(f, "validated"),
        }
    }
}

/// A transition was refused. The problem is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("cannot {action} a problem that is {status}")]
    InvalidTransition {
        status: ProblemStatus,
        action: ActionKind,
    },

    #[error("{actor} has already {phase} this problem")]
    DuplicateVote { actor: ActorId, phase: VotePhase },

    #[error("validation quorum of {required} already reached; the resolution is final")]
    QuorumReached { required: u32 },

    #[error("official note must not be empty")]
    EmptyNote,
}

impl Rejection {
    /// Whether the caller should refresh its view of the problem.
    ///
    /// Duplicate votes are a no-op notice; everything else means the caller
    /// acted on a stale or wrong status.
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            Rejection::InvalidTransition { .. } | Rejection::QuorumReached { .. }
        )
    }
}
