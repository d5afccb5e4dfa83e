//! # Core Domain Entities
//!
//! Identifiers, blocks and state-root snapshots shared by every ledger
//! subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `ShardId`, `ChainId`, `Epoch`, `CommitteeKey`
//! - **Chain**: `BeaconBlock`, `ShardBlock`, `ShardState`, `TxRecord`
//! - **State**: `RootSnapshot`

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::instruction::Instruction;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// Block height within one chain.
pub type BlockHeight = u64;

/// Beacon epoch number.
pub type Epoch = u64;

/// Shard identifier (0..active_shards).
pub type ShardId = u8;

/// The all-zero hash. Also used as the "empty root" placeholder.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Byte used for the beacon chain in storage keys.
pub const BEACON_CHAIN_SYNC_ID: u8 = 255;

/// Identifies one chain: the beacon chain or one shard chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainId {
    /// The coordinating beacon chain.
    Beacon,
    /// One of the shard chains.
    Shard(ShardId),
}

impl ChainId {
    /// Single byte used to namespace storage keys.
    pub fn key_byte(&self) -> u8 {
        match self {
            ChainId::Beacon => BEACON_CHAIN_SYNC_ID,
            ChainId::Shard(id) => *id,
        }
    }

    /// Inverse of [`ChainId::key_byte`].
    pub fn from_key_byte(byte: u8) -> Self {
        if byte == BEACON_CHAIN_SYNC_ID {
            ChainId::Beacon
        } else {
            ChainId::Shard(byte)
        }
    }

    /// Every chain id for a network with `active_shards` shards, beacon last.
    pub fn all(active_shards: u8) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = (0..active_shards).map(ChainId::Shard).collect();
        ids.push(ChainId::Beacon);
        ids
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Beacon => write!(f, "beacon"),
            ChainId::Shard(id) => write!(f, "shard-{}", id),
        }
    }
}

/// A committee member's public identity, as carried in instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitteeKey(pub String);

impl CommitteeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shard holding this key's account: last byte modulo the shard count.
    pub fn shard_of(&self, active_shards: u8) -> ShardId {
        match (self.0.as_bytes().last(), active_shards) {
            (Some(&b), n) if n > 0 => b % n,
            _ => 0,
        }
    }
}

impl fmt::Display for CommitteeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short hex prefix for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

// =============================================================================
// CLUSTER B: STATE
// =============================================================================

/// Per-block state-root snapshot. Immutable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RootSnapshot {
    /// Root of the committee / consensus state.
    pub consensus_root: Hash,
    /// Root of the feature-flag state.
    pub feature_root: Hash,
    /// Root of the reward accumulator state.
    pub reward_root: Hash,
    /// Root of the slashing state.
    pub slash_root: Hash,
}

// =============================================================================
// CLUSTER C: THE CHAIN
// =============================================================================

/// Minimal transaction record. Only its hash and metadata type matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: Hash,
    pub metadata_type: i32,
    /// Destination shard for cross-shard outputs, `None` for local txs.
    pub to_shard: Option<ShardId>,
}

/// Opaque transaction capability consumed by the ledger core.
pub trait Transaction {
    fn hash(&self) -> Hash;
    fn metadata_type(&self) -> i32;
}

impl Transaction for TxRecord {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn metadata_type(&self) -> i32 {
        self.metadata_type
    }
}

/// Committee signatures attached to a block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationData {
    /// Proposer signature bytes.
    pub producer_signature: Vec<u8>,
    /// Aggregated committee signature bytes.
    pub aggregated_signature: Vec<u8>,
    /// Indices of signing committee members.
    pub signer_indices: Vec<usize>,
}

/// Header of a shard block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardHeader {
    pub shard_id: ShardId,
    pub height: BlockHeight,
    pub prev_hash: Hash,
    pub epoch: Epoch,
    /// Beacon height this block was proposed against.
    pub beacon_height: BlockHeight,
    pub beacon_hash: Hash,
    pub timestamp: u64,
    pub proposer: CommitteeKey,
    /// Shards that receive cross-shard output from this block.
    pub cross_shard_bitmap: Vec<ShardId>,
    pub roots: RootSnapshot,
}

impl ShardHeader {
    /// Keccak-256 over the header fields in declaration order.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(b"shard");
        hasher.update([self.shard_id]);
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.epoch.to_be_bytes());
        hasher.update(self.beacon_height.to_be_bytes());
        hasher.update(self.beacon_hash);
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.proposer.as_str().as_bytes());
        hasher.update(&self.cross_shard_bitmap);
        hash_roots(&mut hasher, &self.roots);
        hasher.finalize().into()
    }
}

/// A shard block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardBlock {
    pub header: ShardHeader,
    pub transactions: Vec<TxRecord>,
    pub instructions: Vec<Instruction>,
    pub validation_data: ValidationData,
}

impl ShardBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    /// Transactions destined for `to_shard`.
    pub fn cross_shard_txs(&self, to_shard: ShardId) -> Vec<TxRecord> {
        self.transactions
            .iter()
            .filter(|tx| tx.to_shard == Some(to_shard))
            .cloned()
            .collect()
    }
}

/// A shard block as confirmed inside a beacon block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardState {
    pub height: BlockHeight,
    pub hash: Hash,
    pub cross_shard: Vec<ShardId>,
    pub tx_count: u64,
}

/// Header of a beacon block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconHeader {
    pub height: BlockHeight,
    pub prev_hash: Hash,
    pub epoch: Epoch,
    pub timestamp: u64,
    pub proposer: CommitteeKey,
    pub roots: RootSnapshot,
}

impl BeaconHeader {
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(b"beacon");
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.prev_hash);
        hasher.update(self.epoch.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.proposer.as_str().as_bytes());
        hash_roots(&mut hasher, &self.roots);
        hasher.finalize().into()
    }
}

/// A beacon block: confirmed shard states plus the instruction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlock {
    pub header: BeaconHeader,
    /// Shard states confirmed by this block, keyed by shard.
    pub shard_states: BTreeMap<ShardId, Vec<ShardState>>,
    pub instructions: Vec<Instruction>,
    pub validation_data: ValidationData,
}

impl BeaconBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height
    }
}

fn hash_roots(hasher: &mut Keccak256, roots: &RootSnapshot) {
    hasher.update(roots.consensus_root);
    hasher.update(roots.feature_root);
    hasher.update(roots.reward_root);
    hasher.update(roots.slash_root);
}
