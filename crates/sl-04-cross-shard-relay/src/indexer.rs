//! # Cross-Shard Next-Height Index
//!
//! For each `(from, to)` pair, a linked list of confirmed source heights
//! stored as `(from, to, h) → next`. A beacon block confirming shard states
//! extends every list it touches; existing links are never rewritten, so
//! re-processing a beacon block is harmless.
//!
//! The highest beacon height processed is stored under
//! [`keys::CROSS_SHARD_PROGRESS_KEY`] in the same batch as its links. A
//! caller that failed half way resumes from [`CrossShardIndexer::confirmed_through`].

use std::collections::BTreeMap;

use parking_lot::Mutex;
use shared_types::{BeaconBlock, BlockHeight, ShardId};
use sl_01_block_storage::{keys, BatchOperation, KeyValueStore, SharedKvStore, StorageError};
use tracing::{debug, trace};

use crate::domain::entities::NextCrossShardInfo;
use crate::domain::errors::{RelayError, RelayResult};

/// Writer and reader of the next-height index.
pub struct CrossShardIndexer {
    kv: SharedKvStore,
    /// Last confirmed source height per `(from, to)`.
    last: Mutex<BTreeMap<(ShardId, ShardId), BlockHeight>>,
}

impl CrossShardIndexer {
    pub fn new(kv: SharedKvStore) -> Self {
        Self::with_cursor(kv, BTreeMap::new())
    }

    /// Resume with the cursor kept in the beacon view.
    pub fn with_cursor(kv: SharedKvStore, last: BTreeMap<(ShardId, ShardId), BlockHeight>) -> Self {
        Self {
            kv,
            last: Mutex::new(last),
        }
    }

    pub fn cursor(&self) -> BTreeMap<(ShardId, ShardId), BlockHeight> {
        self.last.lock().clone()
    }

    /// Highest beacon height whose links are durable, if any.
    pub fn confirmed_through(&self) -> RelayResult<Option<BlockHeight>> {
        let Some(bytes) = self.kv.read().get(keys::CROSS_SHARD_PROGRESS_KEY).map_err(StorageError::from)? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| RelayError::CorruptProgress { len: bytes.len() })?;
        Ok(Some(BlockHeight::from_be_bytes(bytes)))
    }

    /// Start the progress marker at `height` unless one is already stored.
    pub fn start_at(&self, height: BlockHeight) -> RelayResult<BlockHeight> {
        if let Some(through) = self.confirmed_through()? {
            return Ok(through);
        }
        self.kv
            .write()
            .put(keys::CROSS_SHARD_PROGRESS_KEY, &height.to_be_bytes())
            .map_err(StorageError::from)?;
        Ok(height)
    }

    /// Extend the index with the shard states confirmed by `block`.
    ///
    /// Returns how many links were written. All links of one block and the
    /// progress marker go in a single atomic batch; the cursor only advances
    /// once it is durable. Blocks at or below the marker are skipped.
    pub fn record_confirmed(&self, block: &BeaconBlock) -> RelayResult<usize> {
        let mut last = self.last.lock();
        if self.confirmed_through()?.is_some_and(|through| block.height() <= through) {
            trace!("[sl-04] beacon {} links already recorded", block.height());
            return Ok(0);
        }
        let mut cursor = last.clone();
        let mut ops = Vec::new();

        {
            let kv = self.kv.read();
            for (&from, states) in &block.shard_states {
                for state in states {
                    for &to in &state.cross_shard {
                        if from == to {
                            continue;
                        }
                        let last_height = cursor.get(&(from, to)).copied().unwrap_or(0);
                        let key = keys::cross_shard_next_key(from, to, last_height);

                        if kv.exists(&key).map_err(StorageError::from)? {
                            trace!("[sl-04] link {}->{} at {} already present", from, to, last_height);
                        } else {
                            let info = NextCrossShardInfo {
                                next_height: state.height,
                                next_hash: state.hash,
                                confirm_beacon_height: block.height(),
                                confirm_beacon_hash: block.hash(),
                            };
                            let bytes = bincode::serialize(&info).map_err(StorageError::from)?;
                            ops.push(BatchOperation::put(key, bytes));
                        }
                        cursor.insert((from, to), state.height);
                    }
                }
            }
        }

        let written = ops.len();
        ops.push(BatchOperation::put(
            keys::CROSS_SHARD_PROGRESS_KEY.to_vec(),
            block.height().to_be_bytes().to_vec(),
        ));
        self.kv.write().atomic_batch_write(ops).map_err(StorageError::from)?;
        *last = cursor;
        debug!(
            "[sl-04] beacon {} confirmed {} new cross-shard links",
            block.height(),
            written
        );
        Ok(written)
    }

    /// Link out of `current` for `(from, to)`, if beacon has confirmed one.
    pub fn fetch_next_height(&self, from: ShardId, to: ShardId, current: BlockHeight) -> RelayResult<Option<NextCrossShardInfo>> {
        let key = keys::cross_shard_next_key(from, to, current);
        let Some(bytes) = self.kv.read().get(&key).map_err(StorageError::from)? else {
            return Ok(None);
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| RelayError::CorruptNextHeight {
                from,
                to,
                height: current,
                message: e.to_string(),
            })
    }
}
