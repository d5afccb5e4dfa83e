//! Relay entities.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, Epoch, Hash, ShardBlock, ShardId, TxRecord};

/// Default cap on source heights per batch.
pub const DEFAULT_MAX_S2B_BLOCKS: usize = 5;

/// Default cap on cross-shard transactions per batch.
pub const DEFAULT_MAX_TXS_PER_BATCH: usize = 2000;

/// Where the chase goes after a given source height, as confirmed by beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCrossShardInfo {
    pub next_height: BlockHeight,
    pub next_hash: Hash,
    pub confirm_beacon_height: BlockHeight,
    pub confirm_beacon_hash: Hash,
}

/// One accepted source block, reduced to what the destination consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossShardPayload {
    pub from_shard: ShardId,
    pub to_shard: ShardId,
    pub height: BlockHeight,
    pub block_hash: Hash,
    pub epoch: Epoch,
    pub confirm_beacon_height: BlockHeight,
    pub transactions: Vec<TxRecord>,
}

impl CrossShardPayload {
    pub fn from_block(block: &ShardBlock, to_shard: ShardId, info: &NextCrossShardInfo) -> Self {
        Self {
            from_shard: block.header.shard_id,
            to_shard,
            height: block.height(),
            block_hash: block.hash(),
            epoch: block.header.epoch,
            confirm_beacon_height: info.confirm_beacon_height,
            transactions: block.cross_shard_txs(to_shard),
        }
    }
}

/// Why a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No more confirmed candidates.
    Exhausted,
    /// `max_s2b_blocks` reached.
    HeightCap,
    /// Next candidate belongs to a later epoch.
    EpochChange,
    /// Last accepted block carried a swap instruction.
    SwapInstruction,
    /// Next candidate would exceed the transaction budget.
    TxBudget,
    /// Next candidate failed committee verification.
    VerifyFailed,
}

/// Output of one relay pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayBatch {
    pub payloads: Vec<CrossShardPayload>,
    /// Height to pass as `start_height` on the next pull.
    pub next_start_height: BlockHeight,
    pub stop_reason: StopReason,
    /// Candidates skipped as out of turn or already delivered.
    pub skipped: usize,
}

/// Batch limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    pub max_s2b_blocks: usize,
    pub max_txs_per_batch: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_s2b_blocks: DEFAULT_MAX_S2B_BLOCKS,
            max_txs_per_batch: DEFAULT_MAX_TXS_PER_BATCH,
        }
    }
}
