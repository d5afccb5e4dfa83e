//! # Chain Views
//!
//! A view is a chain's best state at one block. Beacon and shard views
//! share the capability set {height, hash, previous hash}; `View` is the
//! tagged union the multiview store tracks, so callers match on the
//! variant instead of down-casting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{
    BeaconBlock, BlockHeight, ChainId, Epoch, Hash, RootSnapshot, ShardBlock, ShardId,
};

/// Beacon chain best state at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconView {
    pub height: BlockHeight,
    pub hash: Hash,
    pub prev_hash: Hash,
    pub epoch: Epoch,
    pub roots: RootSnapshot,
    /// Highest confirmed height per shard as of this block.
    pub shard_heights: BTreeMap<ShardId, BlockHeight>,
}

impl BeaconView {
    /// Derive the view that results from applying `block` on top of `parent_shard_heights`.
    pub fn from_block(block: &BeaconBlock, parent_shard_heights: &BTreeMap<ShardId, BlockHeight>) -> Self {
        let mut shard_heights = parent_shard_heights.clone();
        for (shard, states) in &block.shard_states {
            if let Some(last) = states.iter().map(|s| s.height).max() {
                let entry = shard_heights.entry(*shard).or_insert(0);
                *entry = (*entry).max(last);
            }
        }
        Self {
            height: block.header.height,
            hash: block.hash(),
            prev_hash: block.header.prev_hash,
            epoch: block.header.epoch,
            roots: block.header.roots,
            shard_heights,
        }
    }
}

/// Shard chain best state at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardView {
    pub height: BlockHeight,
    pub hash: Hash,
    pub prev_hash: Hash,
    pub epoch: Epoch,
    /// Beacon height the tip block was proposed against.
    pub beacon_height: BlockHeight,
    pub roots: RootSnapshot,
}

impl ShardView {
    pub fn from_block(block: &ShardBlock) -> Self {
        Self {
            height: block.header.height,
            hash: block.hash(),
            prev_hash: block.header.prev_hash,
            epoch: block.header.epoch,
            beacon_height: block.header.beacon_height,
            roots: block.header.roots,
        }
    }
}

/// A view of either chain kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Beacon(BeaconView),
    Shard(ShardId, ShardView),
}

impl View {
    pub fn height(&self) -> BlockHeight {
        match self {
            View::Beacon(v) => v.height,
            View::Shard(_, v) => v.height,
        }
    }

    pub fn hash(&self) -> Hash {
        match self {
            View::Beacon(v) => v.hash,
            View::Shard(_, v) => v.hash,
        }
    }

    pub fn prev_hash(&self) -> Hash {
        match self {
            View::Beacon(v) => v.prev_hash,
            View::Shard(_, v) => v.prev_hash,
        }
    }

    pub fn epoch(&self) -> Epoch {
        match self {
            View::Beacon(v) => v.epoch,
            View::Shard(_, v) => v.epoch,
        }
    }

    pub fn roots(&self) -> &RootSnapshot {
        match self {
            View::Beacon(v) => &v.roots,
            View::Shard(_, v) => &v.roots,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            View::Beacon(_) => ChainId::Beacon,
            View::Shard(id, _) => ChainId::Shard(*id),
        }
    }

    pub fn as_beacon(&self) -> Option<&BeaconView> {
        match self {
            View::Beacon(v) => Some(v),
            View::Shard(..) => None,
        }
    }

    pub fn as_shard(&self) -> Option<&ShardView> {
        match self {
            View::Shard(_, v) => Some(v),
            View::Beacon(_) => None,
        }
    }
}

impl From<BeaconView> for View {
    fn from(v: BeaconView) -> Self {
        View::Beacon(v)
    }
}
