//! Action vocabulary shared by the access policy and the consensus engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action a caller can submit against the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Confirm,
    Validate,
    MarkInReview,
    AttachNote,
    MarkResolved,
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Create,
        ActionKind::Confirm,
        ActionKind::Validate,
        ActionKind::MarkInReview,
        ActionKind::AttachNote,
        ActionKind::MarkResolved,
        ActionKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Confirm => "confirm",
            ActionKind::Validate => "validate",
            ActionKind::MarkInReview => "mark_in_review",
            ActionKind::AttachNote => "attach_note",
            ActionKind::MarkResolved => "mark_resolved",
            ActionKind::Delete => "delete",
        }
    }

    /// Short label for buttons and menus.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Create => "Report",
            ActionKind::Confirm => "I saw it too",
            ActionKind::Validate => "Validate fix",
            ActionKind::MarkInReview => "Review",
            ActionKind::AttachNote => "Add note",
            ActionKind::MarkResolved => "Resolve",
            ActionKind::Delete => "Delete",
        }
    }

    /// Whether this action targets an existing problem.
    pub fn targets_problem(&self) -> bool {
        !matches!(self, ActionKind::Create)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
