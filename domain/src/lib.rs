//! Domain layer for zeladoria
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns and
//! performs no I/O.
//!
//! # Core Concepts
//!
//! ## Problem Lifecycle
//!
//! A citizen reports a problem, other citizens confirm it while it is open,
//! the municipal authority triages and resolves it, and citizens validate the
//! fix until the validation quorum is reached.
//!
//! ## Access Policy
//!
//! Each role holds one fixed capability set. Citizens vote, the authority
//! moves status, the admin deletes.
//!
//! ## Marker Model
//!
//! Marker size grows with confirmations and color follows status. Always
//! recomputed from the latest snapshot.

pub mod access;
pub mod catalog;
pub mod config;
pub mod consensus;
pub mod core;
pub mod marker;
pub mod problem;

// Re-export commonly used types
pub use access::{
    AccessPolicy, ActionKind, Caller, Role, Unauthorized, allowed_actions, authorize,
};
pub use catalog::{
    CatalogVersion, GENERIC_MARKER_ICON, ProblemType, TypeDisplay, grouped_by_category,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use consensus::{
    Applied, ConsensusEngine, Effect, Rejection, Transition, VALIDATION_QUORUM, VotePhase,
    quorum_reached, validations_needed,
};
pub use crate::core::error::DomainError;
pub use marker::{ColorToken, MarkerStyle, visual_color, visual_weight};
pub use problem::{
    ActorId, Location, NewProblem, Problem, ProblemId, ProblemRecord, ProblemStatus, TypeKey,
};
