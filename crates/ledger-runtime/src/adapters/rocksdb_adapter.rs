//! # RocksDB Storage Adapter
//!
//! RocksDB implementation of the `KeyValueStore` port.
//!
//! Every subsystem's keys carry their own prefix (`b-h-`, `c-cp-`, `x-nh-`,
//! ...), so one column family is enough and prefix scans stay ordered.
//!
//! ## Tuning
//!
//! - Snappy compression
//! - Bloom filters (10 bits per key)
//! - LRU block cache
//! - Optional fsync on every write

use std::path::Path;

use parking_lot::RwLock;
use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use sl_01_block_storage::{BatchOperation, KVStoreError, KeyValueStore};

use crate::config::StorageConfig;

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Database under `<data_dir>/ledger`.
    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self {
            path: storage.data_dir.join("ledger").to_string_lossy().to_string(),
            sync_writes: storage.sync_writes,
            ..Default::default()
        }
    }

    /// Small buffers, no fsync.
    pub fn for_testing(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbStore {
    db: RwLock<DB>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| io_error("open", e))?;
        Ok(Self {
            db: RwLock::new(db),
            config,
        })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }
}

fn io_error(op: &str, e: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {} failed: {}", op, e),
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.read().get(key).map_err(|e| io_error("get", e))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let opts = self.write_opts();
        self.db.write().put_opt(key, value, &opts).map_err(|e| io_error("put", e))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        let opts = self.write_opts();
        self.db.write().delete_opt(key, &opts).map_err(|e| io_error("delete", e))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        let opts = self.write_opts();
        self.db.write().write_opt(batch, &opts).map_err(|e| io_error("batch write", e))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .read()
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| io_error("exists", e))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let db = self.db.read();
        let mut results = Vec::new();
        for item in db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| io_error("scan", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}
