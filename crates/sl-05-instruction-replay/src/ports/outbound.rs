//! # Outbound Ports (Driven Ports)
//!
//! Shard committee of a past epoch, needed to split shard rewards.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{ChainId, CommitteeKey, Epoch, ShardId};
use sl_03_committee_checkpoint::{CheckpointApi, CheckpointError};

/// Committee of a shard for a given epoch.
pub trait EpochCommitteeSource: Send + Sync {
    fn shard_committee(&self, shard: ShardId, epoch: Epoch) -> Result<Vec<CommitteeKey>, CheckpointError>;
}

/// Reads committees through the checkpoint store.
pub struct CheckpointCommittees {
    checkpoints: Arc<dyn CheckpointApi>,
}

impl CheckpointCommittees {
    pub fn new(checkpoints: Arc<dyn CheckpointApi>) -> Self {
        Self { checkpoints }
    }
}

impl EpochCommitteeSource for CheckpointCommittees {
    fn shard_committee(&self, shard: ShardId, epoch: Epoch) -> Result<Vec<CommitteeKey>, CheckpointError> {
        self.checkpoints.committee_for_epoch(ChainId::Shard(shard), epoch)
    }
}

/// Fixed committees, for tests.
#[derive(Default)]
pub struct InMemoryEpochCommittees {
    committees: RwLock<HashMap<(ShardId, Epoch), Vec<CommitteeKey>>>,
}

impl InMemoryEpochCommittees {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, shard: ShardId, epoch: Epoch, members: Vec<CommitteeKey>) {
        self.committees.write().insert((shard, epoch), members);
    }
}

impl EpochCommitteeSource for InMemoryEpochCommittees {
    fn shard_committee(&self, shard: ShardId, epoch: Epoch) -> Result<Vec<CommitteeKey>, CheckpointError> {
        self.committees
            .read()
            .get(&(shard, epoch))
            .cloned()
            .ok_or(CheckpointError::NotFound {
                chain: ChainId::Shard(shard),
                epoch,
                height: 0,
            })
    }
}
