//! Consensus domain
//!
//! Pure decision logic that turns citizen votes and authority actions into
//! problem state.
//!
//! # Core Concepts
//!
//! ## Confirmation
//! A citizen corroborates that an open problem is real. Counted once per
//! identity and frozen when triage starts, so the count keeps meaning
//! "how many people were affected".
//!
//! ## Validation Quorum
//! After the authority resolves a problem, citizens attest the fix. Three
//! distinct validations make the resolution final.
//!
//! ## Contest
//! A resolved problem whose resolution is disputed (or whose validations
//! stall) goes back to review and its validations are discarded.

pub mod engine;
pub mod quorum;
pub mod rejection;
pub mod transition;

pub use engine::{Applied, ConsensusEngine, Effect};
pub use quorum::{VALIDATION_QUORUM, quorum_reached, validations_needed};
pub use rejection::{Rejection, VotePhase};
pub use transition::Transition;
