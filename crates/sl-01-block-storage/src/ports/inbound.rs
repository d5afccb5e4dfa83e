//! # Inbound Ports (Driving Ports)
//!
//! The block store API consumed by the multiview, resolver and relay.

use shared_types::{BlockHeight, ChainId, Hash, RootSnapshot, ValidationData};

use crate::domain::entities::StoredBlock;
use crate::domain::errors::StorageResult;

/// Block persistence and lookup.
///
/// Readers may run concurrently with one writer per chain.
pub trait BlockStore: Send + Sync {
    /// Load a block body by hash.
    ///
    /// ## Errors
    ///
    /// - `BlockNotFound`: no block with this hash on `chain`
    /// - `DataCorruption`: checksum mismatch
    fn get_block_by_hash(&self, chain: ChainId, hash: &Hash) -> StorageResult<StoredBlock>;

    /// Load only the committee signatures of a block.
    fn get_block_validation_data(&self, chain: ChainId, hash: &Hash) -> StorageResult<ValidationData>;

    /// Persist a block body. Idempotent for identical content.
    fn store_block(&self, block: &StoredBlock) -> StorageResult<()>;

    /// Persist the root snapshot of a block.
    ///
    /// ## Errors
    ///
    /// - `RootsImmutable`: a different snapshot already exists
    fn store_root_snapshot(&self, chain: ChainId, hash: &Hash, roots: &RootSnapshot) -> StorageResult<()>;

    /// Load the root snapshot of a block.
    fn get_root_snapshot(&self, chain: ChainId, hash: &Hash) -> StorageResult<RootSnapshot>;

    /// Write finalized `(height, hash)` entries in one atomic batch.
    ///
    /// ## Errors
    ///
    /// - `IndexConflict`: an entry exists with a different hash
    fn index_finalized(&self, chain: ChainId, entries: &[(BlockHeight, Hash)]) -> StorageResult<()>;

    /// Hash of the finalized block at `height`, if indexed yet.
    fn get_finalized_hash(&self, chain: ChainId, height: BlockHeight) -> StorageResult<Option<Hash>>;
}
