//! Problem store adapters.
//!
//! - [`MemoryProblemStore`]: process-local, for tests and throwaway runs
//! - [`SqliteProblemStore`]: durable, one database file

mod memory;
mod sqlite;

pub use memory::MemoryProblemStore;
pub use sqlite::SqliteProblemStore;
