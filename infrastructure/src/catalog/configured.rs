//! Type catalog served from configuration.
//!
//! Holds the `[[catalog.types]]` entries in memory. [`replace`] swaps the
//! entry list and bumps the version, which is how a reload becomes visible to
//! every [`CatalogCache`](zeladoria_application::CatalogCache) reading it.
//!
//! [`replace`]: ConfiguredTypeCatalog::replace

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};
use tracing::info;
use zeladoria_application::ports::type_catalog::{CatalogError, TypeCatalog};
use zeladoria_domain::{CatalogVersion, ProblemType};

struct CatalogState {
    version: CatalogVersion,
    entries: Vec<ProblemType>,
}

pub struct ConfiguredTypeCatalog {
    state: RwLock<CatalogState>,
}

impl ConfiguredTypeCatalog {
    pub fn new(version: CatalogVersion, entries: Vec<ProblemType>) -> Self {
        Self {
            state: RwLock::new(CatalogState { version, entries }),
        }
    }

    /// Swap in a new entry list. Returns the new version.
    pub fn replace(&self, entries: Vec<ProblemType>) -> CatalogVersion {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.version = state.version.saturating_add(1);
        state.entries = entries;
        info!(
            "Type catalog replaced: version {} ({} entries)",
            state.version,
            state.entries.len()
        );
        state.version
    }
}

#[async_trait]
impl TypeCatalog for ConfiguredTypeCatalog {
    async fn version(&self) -> Result<CatalogVersion, CatalogError> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version)
    }

    async fn entries(&self) -> Result<Vec<ProblemType>, CatalogError> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone())
    }
}
