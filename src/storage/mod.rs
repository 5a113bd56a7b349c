//! Key-value state storage abstraction.
//!
//! Entitlement state is keyed by wallet address and persisted through a
//! trait-based store so the medium is swappable:
//! - In-memory map (tests, ephemeral deployments)
//! - JSON files on the local filesystem (development, single-node)

mod error;
mod local;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use local::FileStore;
pub use memory::MemoryStore;
pub use traits::{StateStore, get_json, set_json};

use std::sync::Arc;

/// Create a store based on configuration.
pub fn create_store(config: StoreConfig) -> Arc<dyn StateStore> {
    match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::File(path) => Arc::new(FileStore::new(path)),
    }
}

/// State store configuration.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Volatile in-memory store.
    Memory,
    /// JSON files under the given base directory.
    File(String),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory
    }
}
