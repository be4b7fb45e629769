//! Application layer for zeladoria
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod catalog_cache;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use catalog_cache::CatalogCache;
pub use config::WorkflowParams;
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    clock::{Clock, SystemClock},
    problem_store::{ProblemStore, StoreError},
    type_catalog::{CatalogError, TypeCatalog},
};
pub use use_cases::contest_stalled::{ContestStalledUseCase, STALL_POLICY, StallSweepReport};
pub use use_cases::rendering_feed::{
    MarkerView, ProblemSummary, RenderingFeedUseCase, available_actions,
};
pub use use_cases::workflow::{ErrorCategory, WorkflowCoordinator, WorkflowError};
