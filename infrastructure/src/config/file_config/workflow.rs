//! Workflow configuration from TOML (`[workflow]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use zeladoria_application::WorkflowParams;
use zeladoria_domain::{ConfigIssue, ConfigIssueCode};

/// Raw workflow configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkflowConfig {
    /// Bound on every single store call
    pub store_timeout_ms: u64,
    /// Retries after a transient store failure
    pub max_store_retries: u32,
    /// First retry delay; doubled per attempt
    pub retry_backoff_ms: u64,
    /// Bound on waiting for a busy problem
    pub lock_timeout_ms: u64,
    /// Contest resolutions whose validations stall this long (0 disables)
    pub validation_stall_hours: u64,
}

impl Default for FileWorkflowConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 2000,
            max_store_retries: 2,
            retry_backoff_ms: 50,
            lock_timeout_ms: 5000,
            validation_stall_hours: 72,
        }
    }
}

impl FileWorkflowConfig {
    pub fn to_params(&self) -> WorkflowParams {
        let stall = (self.validation_stall_hours > 0)
            .then(|| Duration::from_secs(self.validation_stall_hours.saturating_mul(3600)));
        WorkflowParams::default()
            .with_store_timeout(Duration::from_millis(self.store_timeout_ms))
            .with_max_store_retries(self.max_store_retries)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
            .with_validation_stall(stall)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        [
            ("workflow.store_timeout_ms", self.store_timeout_ms),
            ("workflow.lock_timeout_ms", self.lock_timeout_ms),
        ]
        .into_iter()
        .filter(|(_, value)| *value == 0)
        .map(|(field, _)| {
            ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: field.to_string(),
                },
                format!("{}: must be greater than 0", field),
            )
        })
        .collect()
    }
}
