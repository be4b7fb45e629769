//! Problem type catalog value objects
//!
//! The catalog itself is managed elsewhere; the domain only knows what an
//! entry looks like and how to display a key that has no entry.

use crate::problem::TypeKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Icon used when a type key has no catalog entry.
pub const GENERIC_MARKER_ICON: &str = "📍";

/// Catalog revision. Any catalog mutation must bump it.
pub type CatalogVersion = u64;

/// One entry of the problem type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemType {
    pub key: TypeKey,
    pub title: String,
    pub category: String,
    pub icon: String,
}

impl ProblemType {
    pub fn new(
        key: TypeKey,
        title: impl Into<String>,
        category: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            key,
            title: title.into(),
            category: category.into(),
            icon: icon.into(),
        }
    }
}

/// How a type key is shown next to a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDisplay {
    pub icon: String,
    pub title: String,
    pub category: Option<String>,
}

impl TypeDisplay {
    /// Fallback for keys missing from the catalog: generic pin, raw key as title.
    pub fn generic(key: &TypeKey) -> Self {
        Self {
            icon: GENERIC_MARKER_ICON.to_string(),
            title: key.as_str().to_string(),
            category: None,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.category.is_none()
    }
}

impl From<&ProblemType> for TypeDisplay {
    fn from(entry: &ProblemType) -> Self {
        Self {
            icon: entry.icon.clone(),
            title: entry.title.clone(),
            category: Some(entry.category.clone()),
        }
    }
}

/// Group entries by category for pickers, preserving entry order within a group.
pub fn grouped_by_category(types: &[ProblemType]) -> BTreeMap<&str, Vec<&ProblemType>> {
    let mut groups: BTreeMap<&str, Vec<&ProblemType>> = BTreeMap::new();
    for entry in types {
        groups.entry(entry.category.as_str()).or_default().push(entry);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, category: &str) -> ProblemType {
        ProblemType::new(TypeKey::new(key).unwrap(), key.to_uppercase(), category, "🚧")
    }

    #[test]
    fn test_generic_display() {
        let display = TypeDisplay::generic(&TypeKey::new("arvore_caida").unwrap());
        assert_eq!(display.icon, GENERIC_MARKER_ICON);
        assert_eq!(display.title, "arvore_caida");
        assert!(display.is_generic());
    }

    #[test]
    fn test_display_from_entry() {
        let display = TypeDisplay::from(&entry("buraco", "Vias"));
        assert_eq!(display.title, "BURACO");
        assert_eq!(display.category.as_deref(), Some("Vias"));
        assert!(!display.is_generic());
    }

    #[test]
    fn test_grouped_by_category() {
        let types = vec![
            entry("buraco", "Vias"),
            entry("luz_queimada", "Iluminação"),
            entry("calcada", "Vias"),
        ];
        let groups = grouped_by_category(&types);
        assert_eq!(groups.len(), 2);
        let vias: Vec<_> = groups["Vias"].iter().map(|t| t.key.as_str()).collect();
        assert_eq!(vias, vec!["buraco", "calcada"]);
    }
}
