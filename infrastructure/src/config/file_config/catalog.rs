//! Type catalog configuration from TOML (`[catalog]` section)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use zeladoria_domain::{CatalogVersion, ConfigIssue, ConfigIssueCode, ProblemType, TypeKey};

/// One `[[catalog.types]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProblemType {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
}

impl FileProblemType {
    fn new(key: &str, title: &str, category: &str, icon: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Raw catalog configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    /// Revision of the entry list; bump it whenever `types` changes
    pub version: CatalogVersion,
    /// How often readers re-check the version
    pub refresh_secs: u64,
    pub types: Vec<FileProblemType>,
}

impl Default for FileCatalogConfig {
    fn default() -> Self {
        Self {
            version: 1,
            refresh_secs: 300,
            types: vec![
                FileProblemType::new("buraco", "Buraco na via", "Vias", "🕳️"),
                FileProblemType::new("calcada", "Calçada danificada", "Vias", "🚧"),
                FileProblemType::new("luz_queimada", "Luz queimada", "Iluminação", "💡"),
                FileProblemType::new("lixo", "Lixo acumulado", "Limpeza", "🗑️"),
                FileProblemType::new("vazamento", "Vazamento de água", "Saneamento", "💧"),
            ],
        }
    }
}

impl FileCatalogConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Convert entries into domain types.
    ///
    /// Blank keys are dropped; for duplicate keys the first entry wins. Both
    /// are reported as issues. A blank icon falls back to the generic pin.
    pub fn to_entries(&self) -> (Vec<ProblemType>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.types.len());

        for (index, raw) in self.types.iter().enumerate() {
            let Ok(key) = TypeKey::new(&raw.key) else {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyCatalogKey { index },
                    format!("catalog.types[{}]: key must not be empty", index),
                ));
                continue;
            };
            if !seen.insert(key.clone()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateCatalogKey {
                        key: key.as_str().to_string(),
                    },
                    format!("catalog.types: duplicate key '{}'", key),
                ));
                continue;
            }
            let icon = match raw.icon.trim() {
                "" => zeladoria_domain::GENERIC_MARKER_ICON,
                icon => icon,
            };
            let title = match raw.title.trim() {
                "" => key.as_str(),
                title => title,
            };
            entries.push(ProblemType::new(
                key.clone(),
                title.to_string(),
                raw.category.trim(),
                icon,
            ));
        }
        (entries, issues)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.to_entries().1
    }
}
