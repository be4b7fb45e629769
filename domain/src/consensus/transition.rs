//! Mutations the consensus engine decides on.

use crate::access::ActionKind;
use serde::{Deserialize, Serialize};

/// A requested change to an existing problem.
///
/// Creation and deletion are not transitions: creation is construction and
/// deletion bypasses the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    Validate,
    MarkInReview,
    AttachNote { text: String },
    MarkResolved,
}

impl Transition {
    pub fn attach_note(text: impl Into<String>) -> Self {
        Transition::AttachNote { text: text.into() }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Transition::Confirm => ActionKind::Confirm,
            Transition::Validate => ActionKind::Validate,
            Transition::MarkInReview => ActionKind::MarkInReview,
            Transition::AttachNote { .. } => ActionKind::AttachNote,
            Transition::MarkResolved => ActionKind::MarkResolved,
        }
    }
}
