//! Access policy: role capability sets.
//!
//! Every role maps to one fixed capability set. Authorization, and any
//! presentation that wants to show "what can I do here", both read from
//! [`allowed_actions`], so there is exactly one place that encodes who may do
//! what.
//!
//! | Role      | Capabilities                                 |
//! |-----------|----------------------------------------------|
//! | citizen   | create, confirm, validate                    |
//! | authority | mark_in_review, attach_note, mark_resolved   |
//! | admin     | delete                                       |
//!
//! The authority cannot vote or validate, and citizens cannot change status.

use super::action::ActionKind;
use super::role::{Caller, Role};
use std::collections::BTreeSet;
use thiserror::Error;

const CITIZEN_ACTIONS: &[ActionKind] = &[
    ActionKind::Create,
    ActionKind::Confirm,
    ActionKind::Validate,
];

const AUTHORITY_ACTIONS: &[ActionKind] = &[
    ActionKind::MarkInReview,
    ActionKind::AttachNote,
    ActionKind::MarkResolved,
];

const ADMIN_ACTIONS: &[ActionKind] = &[ActionKind::Delete];

/// A role attempted an action outside its capability set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("role '{role}' is not allowed to {action}")]
pub struct Unauthorized {
    pub role: Role,
    pub action: ActionKind,
}

/// Capability set of a role.
pub fn allowed_actions(role: Role) -> BTreeSet<ActionKind> {
    role_actions(role).iter().copied().collect()
}

/// Check whether `role` may submit `action`.
pub fn authorize(role: Role, action: ActionKind) -> bool {
    role_actions(role).contains(&action)
}

fn role_actions(role: Role) -> &'static [ActionKind] {
    match role {
        Role::Citizen => CITIZEN_ACTIONS,
        Role::Authority => AUTHORITY_ACTIONS,
        Role::Admin => ADMIN_ACTIONS,
    }
}

/// Gatekeeper used by the workflow coordinator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn check(&self, caller: &Caller, action: ActionKind) -> Result<(), Unauthorized> {
        if authorize(caller.role, action) {
            Ok(())
        } else {
            Err(Unauthorized {
                role: caller.role,
                action,
            })
        }
    }
}
