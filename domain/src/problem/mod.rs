//! Problem domain
//!
//! A problem is a citizen report of a municipal issue (pothole, broken
//! streetlight, ...) with a location, a catalog type and a lifecycle status.
//!
//! ```text
//!            confirm (one per citizen)
//!              ┌────┐
//!              ▼    │
//!           ┌────────┐  mark_in_review  ┌───────────┐  mark_resolved  ┌──────────┐
//! report ──▶│  open  │─────────────────▶│ in_review │────────────────▶│ resolved │──▶ quorum
//!           └────────┘                  └───────────┘                 └──────────┘    (terminal)
//!                                         ▲      │ attach_note             │
//!                                         │      └─────┘                   │
//!                                         └──────── contest ───────────────┘
//! ```

pub mod entities;
pub mod value_objects;

pub use entities::{Problem, ProblemRecord, ProblemStatus};
pub use value_objects::{ActorId, Location, NewProblem, ProblemId, TypeKey};
