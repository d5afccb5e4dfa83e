//! # Domain Errors
//!
//! Error types for the block storage subsystem.
//!
//! Lookup misses and backend failures are distinct variants so callers
//! never mistake an I/O failure for "not found".

use shared_types::{short_hex, BlockHeight, ChainId, Hash};
use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("KV I/O error: {message}")]
    IOError { message: String },

    #[error("KV corruption: {message}")]
    CorruptionError { message: String },

    #[error("Key not found")]
    NotFound,
}

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Block with this hash was not found.
    #[error("Block not found on {chain}: {}", short_hex(.hash))]
    BlockNotFound { chain: ChainId, hash: Hash },

    /// Root snapshot for this block was not found.
    #[error("Root snapshot not found on {chain}: {}", short_hex(.hash))]
    RootsNotFound { chain: ChainId, hash: Hash },

    /// Stored block failed its checksum.
    #[error("Data corruption for block {}: expected checksum {expected}, got {actual}", short_hex(.hash))]
    DataCorruption { hash: Hash, expected: u32, actual: u32 },

    /// Root snapshot already written with different content.
    #[error("Root snapshot for {} is immutable", short_hex(.hash))]
    RootsImmutable { hash: Hash },

    /// Finalized index would change an existing entry.
    #[error("Finalized index conflict on {chain} at height {height}")]
    IndexConflict { chain: ChainId, height: BlockHeight },

    /// Database I/O error.
    #[error("Database error: {message}")]
    DatabaseError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl From<KVStoreError> for StorageError {
    fn from(e: KVStoreError) -> Self {
        StorageError::DatabaseError {
            message: e.to_string(),
        }
    }
}

impl From<bincode::Error> for StorageError {
    fn from(e: bincode::Error) -> Self {
        StorageError::SerializationError {
            message: e.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
