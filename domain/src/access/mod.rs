//! Access domain
//!
//! Roles, the action vocabulary, and the capability-set policy that
//! decides which role may submit which action.

pub mod action;
pub mod policy;
pub mod role;

pub use action::ActionKind;
pub use policy::{AccessPolicy, Unauthorized, allowed_actions, authorize};
pub use role::{Caller, Role};
