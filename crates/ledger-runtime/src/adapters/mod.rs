//! # Storage Adapters
//!
//! Picks the `KeyValueStore` backend named in [`StorageConfig`].
//!
//! Enable the `rocksdb` feature for the durable backend:
//!
//! ```toml
//! ledger-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use sl_01_block_storage::{shared, InMemoryKVStore, KVStoreError, SharedKvStore};
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Open the configured backend.
pub fn open_store(config: &StorageConfig) -> Result<SharedKvStore, KVStoreError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("[runtime] using in-memory storage; nothing survives a restart");
            Ok(shared(InMemoryKVStore::new()))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => {
            let rocks = RocksDbConfig::from_storage(config);
            info!("[runtime] opening RocksDB at {}", rocks.path);
            Ok(shared(RocksDbStore::open(rocks)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => Err(KVStoreError::IOError {
            message: "built without the rocksdb feature".to_string(),
        }),
    }
}
