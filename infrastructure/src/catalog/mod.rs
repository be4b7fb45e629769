//! Type catalog adapters.

mod configured;

pub use configured::ConfiguredTypeCatalog;
