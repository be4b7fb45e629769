//! Stall sweep use case
//!
//! A resolution that sits below the validation quorum for longer than the
//! configured stall window is sent back to review, the same way an
//! authority would contest it. The sweep acts as `system:stall-policy`.

use crate::ports::clock::Clock;
use crate::use_cases::workflow::{WorkflowCoordinator, WorkflowError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use zeladoria_domain::{Problem, ProblemId, ProblemStatus, Transition};

/// Policy name recorded as the acting identity.
pub const STALL_POLICY: &str = "stall-policy";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StallSweepReport {
    /// Problems sent back to review.
    pub contested: Vec<ProblemId>,
    /// Stalled problems whose state changed before the sweep reached them.
    pub skipped: Vec<ProblemId>,
}

fn is_stalled(problem: &Problem, now: DateTime<Utc>, stall_after: Duration) -> bool {
    if problem.status() != ProblemStatus::Resolved || problem.is_confirmed_resolved() {
        return false;
    }
    let Some(resolved_at) = problem.resolved_at() else {
        return false;
    };
    // Negative elapsed (clock skew) never counts as stalled.
    now.signed_duration_since(resolved_at)
        .to_std()
        .is_ok_and(|elapsed| elapsed >= stall_after)
}

pub struct ContestStalledUseCase {
    coordinator: Arc<WorkflowCoordinator>,
    clock: Arc<dyn Clock>,
    stall_after: Duration,
}

impl ContestStalledUseCase {
    pub fn new(
        coordinator: Arc<WorkflowCoordinator>,
        clock: Arc<dyn Clock>,
        stall_after: Duration,
    ) -> Self {
        Self {
            coordinator,
            clock,
            stall_after,
        }
    }

    fn is_stalled(&self, problem: &Problem) -> bool {
        is_stalled(problem, self.clock.now(), self.stall_after)
    }

    pub async fn execute(&self) -> Result<StallSweepReport, WorkflowError> {
        let stalled: Vec<ProblemId> = self
            .coordinator
            .list()
            .await?
            .iter()
            .filter(|p| self.is_stalled(p))
            .map(Problem::id)
            .collect();

        let mut report = StallSweepReport::default();
        for id in stalled {
            // The listed snapshot may be out of date by now.
            let (now, stall_after) = (self.clock.now(), self.stall_after);
            let still_stalled = move |current: &Problem| is_stalled(current, now, stall_after);
            match self
                .coordinator
                .apply_policy(STALL_POLICY, id, Transition::MarkInReview, still_stalled)
                .await
            {
                Ok(Some(_)) => {
                    info!("Contested stalled resolution {}", id);
                    report.contested.push(id);
                }
                Ok(None)
                | Err(WorkflowError::InvalidTransition(_) | WorkflowError::NotFound(_)) => {
                    debug!("Problem {} changed before the sweep reached it", id);
                    report.skipped.push(id);
                }
                Err(e) => {
                    warn!("Stall sweep stopped at {}: {}", id, e);
                    return Err(e);
                }
            }
        }
        Ok(report)
    }
}
