//! Consensus engine: the problem state machine.
//!
//! [`ConsensusEngine::apply`] is a pure function of the current problem, the
//! requested [`Transition`], the acting identity, and the commit time. It
//! performs no I/O and never retries; a refused transition returns a
//! [`Rejection`] and the input problem is left as it was.
//!
//! | Current   | Transition     | Precondition                 | Effect                       |
//! |-----------|----------------|------------------------------|------------------------------|
//! | open      | confirm        | not yet confirmed by actor   | confirmations += 1           |
//! | open      | mark_in_review | none                         | → in_review                  |
//! | in_review | attach_note    | note non-empty               | note set                     |
//! | in_review | mark_resolved  | none                         | → resolved, validations = 0  |
//! | resolved  | validate       | not yet validated, no quorum | validations += 1             |
//! | resolved  | mark_in_review | no quorum                    | → in_review, validations = 0 |

use super::quorum::{VALIDATION_QUORUM, quorum_reached};
use super::rejection::{Rejection, VotePhase};
use super::transition::Transition;
use crate::access::ActionKind;
use crate::core::string::non_blank;
use crate::problem::{ActorId, Problem, ProblemStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What an accepted transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Confirmed { confirmations: u32 },
    EnteredReview,
    /// A resolved problem was sent back to review.
    Contested,
    NoteAttached,
    Resolved,
    Validated { validations: u32, quorum_reached: bool },
}

impl Effect {
    /// Event name used in the audit log.
    pub fn event_type(&self) -> &'static str {
        match self {
            Effect::Confirmed { .. } => "problem_confirmed",
            Effect::EnteredReview => "problem_in_review",
            Effect::Contested => "problem_contested",
            Effect::NoteAttached => "note_attached",
            Effect::Resolved => "problem_resolved",
            Effect::Validated { .. } => "problem_validated",
        }
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub problem: Problem,
    pub effect: Effect,
}

/// Decides problem transitions.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use zeladoria_domain::{
///     ActorId, ConsensusEngine, NewProblem, Problem, ProblemId, Rejection, Transition,
/// };
///
/// let engine = ConsensusEngine;
/// let maria = ActorId::new("maria").unwrap();
/// let joao = ActorId::new("joao").unwrap();
/// let report = NewProblem::new("buraco", "Cratera", -23.55, -46.63).unwrap();
/// let problem = Problem::report(ProblemId::new(1), report, maria.clone(), Utc::now());
///
/// let applied = engine.apply(&problem, &Transition::Confirm, &joao, Utc::now()).unwrap();
/// assert_eq!(applied.problem.confirmation_count(), 2);
///
/// // The reporter's confirmation is implicit
/// let err = engine.apply(&problem, &Transition::Confirm, &maria, Utc::now()).unwrap_err();
/// assert!(matches!(err, Rejection::DuplicateVote { .. }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusEngine;

impl ConsensusEngine {
    /// Compute the next state of `problem`, or refuse.
    pub fn apply(
        &self,
        problem: &Problem,
        transition: &Transition,
        actor: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<Applied, Rejection> {
        let mut next = problem.clone();

        let effect = match (problem.status, transition) {
            (ProblemStatus::Open, Transition::Confirm) => {
                if !next.confirmed_by.insert(actor.clone()) {
                    return Err(Rejection::DuplicateVote {
                        actor: actor.clone(),
                        phase: VotePhase::Confirmation,
                    });
                }
                Effect::Confirmed {
                    confirmations: next.confirmation_count(),
                }
            }

            (ProblemStatus::Open, Transition::MarkInReview) => {
                next.status = ProblemStatus::InReview;
                Effect::EnteredReview
            }

            (ProblemStatus::InReview, Transition::AttachNote { text }) => {
                let note = non_blank(text).ok_or(Rejection::EmptyNote)?;
                next.official_note = Some(note);
                Effect::NoteAttached
            }

            (ProblemStatus::InReview, Transition::MarkResolved) => {
                next.status = ProblemStatus::Resolved;
                next.validated_by.clear();
                next.resolved_at = Some(at);
                Effect::Resolved
            }

            (ProblemStatus::Resolved, Transition::Validate) => {
                if problem.is_confirmed_resolved() {
                    return Err(Rejection::QuorumReached {
                        required: VALIDATION_QUORUM,
                    });
                }
                if !next.validated_by.insert(actor.clone()) {
                    return Err(Rejection::DuplicateVote {
                        actor: actor.clone(),
                        phase: VotePhase::Validation,
                    });
                }
                let validations = next.validation_count();
                Effect::Validated {
                    validations,
                    quorum_reached: quorum_reached(validations),
                }
            }

            (ProblemStatus::Resolved, Transition::MarkInReview) => {
                if problem.is_confirmed_resolved() {
                    return Err(Rejection::QuorumReached {
                        required: VALIDATION_QUORUM,
                    });
                }
                next.status = ProblemStatus::InReview;
                next.validated_by.clear();
                next.resolved_at = None;
                Effect::Contested
            }

            (status, transition) => {
                return Err(Rejection::InvalidTransition {
                    status,
                    action: transition.kind(),
                });
            }
        };

        next.updated_at = at;
        Ok(Applied {
            problem: next,
            effect,
        })
    }

    /// Actions that could succeed against `problem` in its current state,
    /// regardless of who submits them. Delete is always legal.
    pub fn legal_actions(&self, problem: &Problem) -> BTreeSet<ActionKind> {
        let mut actions = BTreeSet::from([ActionKind::Delete]);
        match problem.status {
            ProblemStatus::Open => {
                actions.extend([ActionKind::Confirm, ActionKind::MarkInReview]);
            }
            ProblemStatus::InReview => {
                actions.extend([ActionKind::AttachNote, ActionKind::MarkResolved]);
            }
            ProblemStatus::Resolved if !problem.is_confirmed_resolved() => {
                actions.extend([ActionKind::Validate, ActionKind::MarkInReview]);
            }
            ProblemStatus::Resolved => {}
        }
        actions
    }
}
