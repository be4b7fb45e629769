//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod contest_stalled;
pub mod rendering_feed;
pub(crate) mod shared;
pub mod workflow;
