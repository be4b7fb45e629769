//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod catalog;
mod logging;
mod output;
mod store;
mod workflow;

pub use catalog::{FileCatalogConfig, FileProblemType};
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use store::{FileStoreConfig, StoreBackend};
pub use workflow::FileWorkflowConfig;

use serde::{Deserialize, Serialize};
use zeladoria_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Problem store backend
    pub store: FileStoreConfig,
    /// Coordinator timeouts, retries and stall policy
    pub workflow: FileWorkflowConfig,
    /// Problem type catalog
    pub catalog: FileCatalogConfig,
    /// Log file and audit trail locations
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Store backend and its required path
    /// 2. Zero timeouts in the workflow section
    /// 3. Blank and duplicate catalog keys
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.store.validate());
        issues.extend(self.workflow.validate());
        issues.extend(self.catalog.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeladoria_domain::OutputFormat;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[store]
backend = "sqlite"
path = "/var/lib/zeladoria/problems.db"

[workflow]
store_timeout_ms = 500
max_store_retries = 4
lock_timeout_ms = 1000
validation_stall_hours = 24

[catalog]
version = 3

[[catalog.types]]
key = "buraco"
title = "Buraco na via"
category = "Vias"
icon = "🕳️"

[logging]
audit_log = "audit.jsonl"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.store.path.as_deref(),
            Some("/var/lib/zeladoria/problems.db")
        );
        assert_eq!(config.workflow.store_timeout_ms, 500);
        assert_eq!(config.workflow.max_store_retries, 4);
        // Unset fields keep their defaults
        assert_eq!(config.workflow.retry_backoff_ms, 50);
        assert_eq!(config.catalog.version, 3);
        assert_eq!(config.catalog.types.len(), 1);
        assert_eq!(config.logging.audit_log.as_deref(), Some("audit.jsonl"));
        assert!(config.logging.file.is_none());
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[store]
backend = "memory"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.parse_backend().0, Some(StoreBackend::Memory));
        // Defaults should apply
        assert_eq!(config.workflow, FileWorkflowConfig::default());
        assert_eq!(config.catalog.types.len(), 5);
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_collects_all_sections() {
        let toml_str = r#"
[store]
backend = "redis"

[workflow]
store_timeout_ms = 0

[[catalog.types]]
key = ""
title = "?"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(ConfigIssue::is_error));
    }
}
