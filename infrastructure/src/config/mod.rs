//! Configuration file loading for zeladoria
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ZELADORIA_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./zeladoria.toml` or `./.zeladoria.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/zeladoria/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileCatalogConfig, FileConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat,
    FileProblemType, FileStoreConfig, FileWorkflowConfig, StoreBackend,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
