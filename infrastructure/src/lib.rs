//! Infrastructure layer for zeladoria
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use catalog::ConfiguredTypeCatalog;
pub use config::{
    ConfigLoader, FileCatalogConfig, FileConfig, FileLoggingConfig, FileOutputConfig,
    FileOutputFormat, FileStoreConfig, FileWorkflowConfig, StoreBackend,
};
pub use logging::JsonlAuditLogger;
pub use store::{MemoryProblemStore, SqliteProblemStore};
