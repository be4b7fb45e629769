//! Store configuration from TOML (`[store]` section)

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use zeladoria_domain::{ConfigIssue, ConfigIssueCode};

/// Which problem store adapter to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(other.to_string()),
        }
    }
}

/// Raw store configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// "sqlite" or "memory"
    pub backend: String,
    /// Database file for the sqlite backend
    pub path: Option<String>,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: Some("zeladoria.db".to_string()),
        }
    }
}

impl FileStoreConfig {
    /// Parse backend string into StoreBackend
    ///
    /// Accepts: "sqlite", "memory", "mem"
    pub fn parse_backend(&self) -> (Option<StoreBackend>, Vec<ConfigIssue>) {
        match self.backend.parse::<StoreBackend>() {
            Ok(backend) => (Some(backend), vec![]),
            Err(value) => {
                let issue = ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "store.backend".to_string(),
                        value: value.clone(),
                        valid_values: vec!["sqlite".to_string(), "memory".to_string()],
                    },
                    format!("store.backend: unknown value '{}'", value),
                );
                (None, vec![issue])
            }
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (backend, mut issues) = self.parse_backend();
        let missing_path = self.path.as_deref().is_none_or(|p| p.trim().is_empty());
        if backend == Some(StoreBackend::Sqlite) && missing_path {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "store.path".to_string(),
                },
                "store.path is required when store.backend = \"sqlite\"",
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        let config = FileStoreConfig {
            backend: "Memory".to_string(),
            path: None,
        };
        assert_eq!(config.parse_backend().0, Some(StoreBackend::Memory));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let config = FileStoreConfig {
            backend: "postgres".to_string(),
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let config = FileStoreConfig {
            backend: "sqlite".to_string(),
            path: Some("  ".to_string()),
        };
        let issues = config.validate();
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::MissingValue { ref field } if field == "store.path"
        ));
    }
}
