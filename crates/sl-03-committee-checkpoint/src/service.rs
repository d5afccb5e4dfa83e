//! # Checkpoint Store Service
//!
//! One [`CheckpointTable`] per chain behind a single `RwLock`. Updates hold
//! the write lock for the whole cross-check and persist, so a reader never
//! sees a table that is not on disk.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{short_hex, BlockHeight, ChainId, CommitteeKey, Epoch, Hash};
use sl_01_block_storage::{keys, KeyValueStore, SharedKvStore, StorageError};
use tracing::{debug, error, info, warn};

use crate::domain::checkpoint::{CheckpointTable, CommitteeCheckpoint, EMPTY_ROOT, SENTINEL_HEIGHT};
use crate::domain::errors::{CheckpointError, CheckpointResult};
use crate::ports::inbound::CheckpointApi;
use crate::ports::outbound::CommitteeReader;

/// Committee checkpoint store for the beacon chain and every active shard.
pub struct CheckpointStore {
    tables: RwLock<HashMap<ChainId, CheckpointTable>>,
    kv: SharedKvStore,
    reader: Arc<dyn CommitteeReader>,
    active_shards: u8,
}

impl CheckpointStore {
    /// Empty store. Use [`CheckpointStore::restore`] at startup instead.
    pub fn new(kv: SharedKvStore, reader: Arc<dyn CommitteeReader>, active_shards: u8) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            kv,
            reader,
            active_shards,
        }
    }

    /// Load every chain's persisted table.
    ///
    /// A chain with nothing persisted starts empty. A table that does not
    /// decode, decodes into an inconsistent shape, or has heights going
    /// backwards across epochs is `CorruptTable`.
    pub fn restore(kv: SharedKvStore, reader: Arc<dyn CommitteeReader>, active_shards: u8) -> CheckpointResult<Self> {
        let mut tables = HashMap::new();
        {
            let guard = kv.read();
            for chain in ChainId::all(active_shards) {
                let Some(bytes) = guard.get(&keys::checkpoint_key(chain)).map_err(StorageError::from)? else {
                    continue;
                };
                let table: CheckpointTable =
                    serde_json::from_slice(&bytes).map_err(|e| CheckpointError::CorruptTable {
                        chain,
                        message: e.to_string(),
                    })?;
                if !table.is_well_formed() {
                    return Err(CheckpointError::CorruptTable {
                        chain,
                        message: "epoch list does not match checkpoint data".to_string(),
                    });
                }
                if !table.heights_monotonic() {
                    return Err(CheckpointError::CorruptTable {
                        chain,
                        message: "checkpoint heights decrease across epochs".to_string(),
                    });
                }
                debug!("[sl-03] restored {} checkpoints for {}", table.len(), chain);
                tables.insert(chain, table);
            }
        }
        info!("[sl-03] checkpoint tables restored for {} chains", tables.len());

        Ok(Self {
            tables: RwLock::new(tables),
            kv,
            reader,
            active_shards,
        })
    }

    /// Copy of one chain's table.
    pub fn table(&self, chain: ChainId) -> CheckpointTable {
        self.tables.read().get(&chain).cloned().unwrap_or_default()
    }

    fn check_chain(&self, chain: ChainId) -> CheckpointResult<()> {
        match chain {
            ChainId::Shard(id) if id >= self.active_shards => Err(CheckpointError::UnknownChain { chain }),
            _ => Ok(()),
        }
    }

    /// Member-for-member comparison of both sides of one committee.
    fn cross_check(&self, chain: ChainId, epoch: Epoch, beacon_root: Hash, shard_root: Hash) -> CheckpointResult<()> {
        let beacon_side = self.reader.beacon_committee(chain, &beacon_root)?;
        let shard_side = self.reader.shard_committee(chain, &shard_root)?;

        let first_difference = beacon_side
            .iter()
            .zip(shard_side.iter())
            .position(|(b, s)| b != s)
            .or_else(|| (beacon_side.len() != shard_side.len()).then(|| beacon_side.len().min(shard_side.len())));

        match first_difference {
            None => Ok(()),
            Some(first_difference) => {
                error!(
                    "[sl-03] committee mismatch on {} epoch {}: beacon root {} vs shard root {}",
                    chain,
                    epoch,
                    short_hex(&beacon_root),
                    short_hex(&shard_root)
                );
                Err(CheckpointError::IntegrityViolation {
                    chain,
                    epoch,
                    beacon_root,
                    shard_root,
                    beacon_len: beacon_side.len(),
                    shard_len: shard_side.len(),
                    first_difference,
                })
            }
        }
    }

    /// Persist `table` for `chain`. Nothing is committed in memory on error.
    fn persist(&self, chain: ChainId, table: &CheckpointTable) -> CheckpointResult<()> {
        let bytes = serde_json::to_vec(table).map_err(|e| StorageError::SerializationError { message: e.to_string() })?;
        self.kv
            .write()
            .put(&keys::checkpoint_key(chain), &bytes)
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl CheckpointApi for CheckpointStore {
    fn update_from_beacon(&self, chain: ChainId, epoch: Epoch, root_hash: Hash) -> CheckpointResult<()> {
        self.check_chain(chain)?;
        let mut tables = self.tables.write();
        let mut table = tables.get(&chain).cloned().unwrap_or_default();

        let checkpoint = match table.get(epoch).copied() {
            Some(existing) => {
                if let (ChainId::Shard(_), Some(shard_root)) = (chain, existing.shard_root) {
                    self.cross_check(chain, epoch, root_hash, shard_root)?;
                }
                CommitteeCheckpoint {
                    root_hash,
                    ..existing
                }
            }
            None => CommitteeCheckpoint {
                height: SENTINEL_HEIGHT,
                root_hash,
                shard_root: None,
            },
        };
        table.upsert(epoch, checkpoint);

        self.persist(chain, &table)?;
        tables.insert(chain, table);
        debug!("[sl-03] {} epoch {} beacon root {}", chain, epoch, short_hex(&root_hash));
        Ok(())
    }

    fn update_from_shard(&self, chain: ChainId, epoch: Epoch, height: BlockHeight, root_hash: Hash) -> CheckpointResult<()> {
        self.check_chain(chain)?;
        let mut tables = self.tables.write();
        let mut table = tables.get(&chain).cloned().unwrap_or_default();

        let beacon_root = table.get(epoch).map(|cp| cp.root_hash).unwrap_or(EMPTY_ROOT);
        if beacon_root != EMPTY_ROOT && matches!(chain, ChainId::Shard(_)) {
            self.cross_check(chain, epoch, beacon_root, root_hash)?;
        }
        table.upsert(
            epoch,
            CommitteeCheckpoint {
                height,
                root_hash: beacon_root,
                shard_root: Some(root_hash),
            },
        );
        if !table.heights_monotonic() {
            warn!("[sl-03] {} epoch {} height {} out of epoch order, rejected", chain, epoch, height);
            return Err(CheckpointError::HeightOutOfOrder { chain, epoch, height });
        }

        self.persist(chain, &table)?;
        tables.insert(chain, table);
        debug!("[sl-03] {} epoch {} takes effect at height {}", chain, epoch, height);
        Ok(())
    }

    fn lookup_by_epoch(&self, chain: ChainId, epoch: Epoch) -> (Epoch, Hash) {
        self.tables
            .read()
            .get(&chain)
            .map(|t| t.at_or_before(epoch))
            .unwrap_or((0, EMPTY_ROOT))
    }

    fn lookup_by_epoch_and_height(&self, chain: ChainId, epoch: Epoch, height: BlockHeight) -> CheckpointResult<(Epoch, Hash)> {
        self.tables
            .read()
            .get(&chain)
            .and_then(|t| t.in_effect_at(epoch, height))
            .ok_or(CheckpointError::NotFound { chain, epoch, height })
    }

    fn committee_for_epoch(&self, chain: ChainId, epoch: Epoch) -> CheckpointResult<Vec<CommitteeKey>> {
        let (resolved, root) = self.lookup_by_epoch(chain, epoch);
        if root == EMPTY_ROOT {
            return Err(CheckpointError::NotFound { chain, epoch, height: resolved });
        }
        Ok(self.reader.beacon_committee(chain, &root)?)
    }

    fn committee_at(&self, chain: ChainId, epoch: Epoch, height: BlockHeight) -> CheckpointResult<Vec<CommitteeKey>> {
        let (_, root) = self.lookup_by_epoch_and_height(chain, epoch, height)?;
        Ok(self.reader.beacon_committee(chain, &root)?)
    }
}
