//! Application-level configuration.
//!
//! - [`WorkflowParams`]: store timeouts, retries, lock wait and stall policy

pub mod workflow_params;

pub use workflow_params::WorkflowParams;
