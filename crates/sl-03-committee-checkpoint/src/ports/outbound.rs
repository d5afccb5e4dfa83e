//! # Outbound Ports (Driven Ports)
//!
//! Committee state lookups behind a state root.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{short_hex, ChainId, CommitteeKey, Hash};
use thiserror::Error;

/// Failure to load a committee from state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitteeReadError {
    #[error("No committee state for {chain} at root {}", short_hex(.root))]
    UnknownRoot { chain: ChainId, root: Hash },

    #[error("Committee state read failed: {message}")]
    Backend { message: String },
}

/// Reads one chain's committee out of the two independently kept state
/// databases.
pub trait CommitteeReader: Send + Sync {
    /// Committee of `chain` as recorded in beacon state at `root`.
    fn beacon_committee(&self, chain: ChainId, root: &Hash) -> Result<Vec<CommitteeKey>, CommitteeReadError>;

    /// Committee of `chain` as recorded in that chain's own state at `root`.
    fn shard_committee(&self, chain: ChainId, root: &Hash) -> Result<Vec<CommitteeKey>, CommitteeReadError>;
}

/// In-memory committee reader for tests and the memory backend.
#[derive(Default)]
pub struct InMemoryCommitteeReader {
    beacon: RwLock<HashMap<(ChainId, Hash), Vec<CommitteeKey>>>,
    shard: RwLock<HashMap<(ChainId, Hash), Vec<CommitteeKey>>>,
}

impl InMemoryCommitteeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_beacon_committee(&self, chain: ChainId, root: Hash, members: Vec<CommitteeKey>) {
        self.beacon.write().insert((chain, root), members);
    }

    pub fn set_shard_committee(&self, chain: ChainId, root: Hash, members: Vec<CommitteeKey>) {
        self.shard.write().insert((chain, root), members);
    }
}

impl CommitteeReader for InMemoryCommitteeReader {
    fn beacon_committee(&self, chain: ChainId, root: &Hash) -> Result<Vec<CommitteeKey>, CommitteeReadError> {
        self.beacon
            .read()
            .get(&(chain, *root))
            .cloned()
            .ok_or(CommitteeReadError::UnknownRoot { chain, root: *root })
    }

    fn shard_committee(&self, chain: ChainId, root: &Hash) -> Result<Vec<CommitteeKey>, CommitteeReadError> {
        self.shard
            .read()
            .get(&(chain, *root))
            .cloned()
            .ok_or(CommitteeReadError::UnknownRoot { chain, root: *root })
    }
}
