//! Type catalog port
//!
//! The catalog of problem types is owned by an external source. Readers go
//! through [`CatalogCache`](crate::catalog_cache::CatalogCache), which only
//! reloads entries when the catalog version changes.

use async_trait::async_trait;
use thiserror::Error;
use zeladoria_domain::{CatalogVersion, ProblemType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Type catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidEntry(String),
}

/// Source of problem type definitions.
#[async_trait]
pub trait TypeCatalog: Send + Sync {
    /// Current revision. Cheap; called on every cache refresh check.
    async fn version(&self) -> Result<CatalogVersion, CatalogError>;

    /// Every entry, in display order.
    async fn entries(&self) -> Result<Vec<ProblemType>, CatalogError>;
}
