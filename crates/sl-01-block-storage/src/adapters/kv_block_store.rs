//! `BlockStore` over any [`KeyValueStore`].

use shared_types::{short_hex, BlockHeight, ChainId, Hash, RootSnapshot, ValidationData};
use tracing::debug;

use crate::domain::entities::StoredBlock;
use crate::domain::errors::{StorageError, StorageResult};
use crate::domain::keys;
use crate::ports::inbound::BlockStore;
use crate::ports::outbound::{BatchOperation, SharedKvStore};

/// Block store backed by a shared key-value store.
#[derive(Clone)]
pub struct KvBlockStore {
    kv: SharedKvStore,
}

impl KvBlockStore {
    pub fn new(kv: SharedKvStore) -> Self {
        Self { kv }
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &SharedKvStore {
        &self.kv
    }
}

impl BlockStore for KvBlockStore {
    fn get_block_by_hash(&self, chain: ChainId, hash: &Hash) -> StorageResult<StoredBlock> {
        let bytes = self
            .kv
            .read()
            .get(&keys::block_key(chain, hash))?
            .ok_or(StorageError::BlockNotFound { chain, hash: *hash })?;
        StoredBlock::decode(hash, &bytes)
    }

    fn get_block_validation_data(&self, chain: ChainId, hash: &Hash) -> StorageResult<ValidationData> {
        Ok(self.get_block_by_hash(chain, hash)?.validation_data().clone())
    }

    fn store_block(&self, block: &StoredBlock) -> StorageResult<()> {
        let chain = block.chain_id();
        let hash = block.hash();
        let bytes = block.encode()?;
        self.kv.write().put(&keys::block_key(chain, &hash), &bytes)?;
        debug!("[sl-01] stored block {} at height {} on {}", short_hex(&hash), block.height(), chain);
        Ok(())
    }

    fn store_root_snapshot(&self, chain: ChainId, hash: &Hash, roots: &RootSnapshot) -> StorageResult<()> {
        let key = keys::roots_key(chain, hash);
        let bytes = bincode::serialize(roots)?;
        let mut kv = self.kv.write();
        if let Some(existing) = kv.get(&key)? {
            if existing == bytes {
                return Ok(());
            }
            return Err(StorageError::RootsImmutable { hash: *hash });
        }
        kv.put(&key, &bytes)?;
        Ok(())
    }

    fn get_root_snapshot(&self, chain: ChainId, hash: &Hash) -> StorageResult<RootSnapshot> {
        let bytes = self
            .kv
            .read()
            .get(&keys::roots_key(chain, hash))?
            .ok_or(StorageError::RootsNotFound { chain, hash: *hash })?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn index_finalized(&self, chain: ChainId, entries: &[(BlockHeight, Hash)]) -> StorageResult<()> {
        let mut kv = self.kv.write();
        let mut batch = Vec::with_capacity(entries.len());
        for (height, hash) in entries {
            let key = keys::finalized_height_key(chain, *height);
            match kv.get(&key)? {
                Some(existing) if existing.as_slice() == hash.as_slice() => continue,
                Some(_) => {
                    return Err(StorageError::IndexConflict {
                        chain,
                        height: *height,
                    })
                }
                None => batch.push(BatchOperation::put(key, hash.to_vec())),
            }
        }
        if batch.is_empty() {
            return Ok(());
        }
        let written = batch.len();
        kv.atomic_batch_write(batch)?;
        debug!("[sl-01] indexed {} finalized heights on {}", written, chain);
        Ok(())
    }

    fn get_finalized_hash(&self, chain: ChainId, height: BlockHeight) -> StorageResult<Option<Hash>> {
        let Some(bytes) = self.kv.read().get(&keys::finalized_height_key(chain, height))? else {
            return Ok(None);
        };
        let hash: Hash = bytes.as_slice().try_into().map_err(|_| StorageError::SerializationError {
            message: format!("finalized hash at height {} has {} bytes", height, bytes.len()),
        })?;
        Ok(Some(hash))
    }
}
