//! # Inbound Ports (Driving Ports)
//!
//! Checkpoint API used by beacon/shard processing and committee queries.

use shared_types::{BlockHeight, ChainId, CommitteeKey, Epoch, Hash};

use crate::domain::errors::CheckpointResult;

/// Committee checkpoint store API.
pub trait CheckpointApi: Send + Sync {
    /// Beacon side observed `epoch` with committee root `root_hash`.
    ///
    /// ## Errors
    ///
    /// - `IntegrityViolation` (fatal): committees disagree
    /// - `Storage`: table not persisted, update discarded
    fn update_from_beacon(&self, chain: ChainId, epoch: Epoch, root_hash: Hash) -> CheckpointResult<()>;

    /// Shard side reached the `epoch` boundary at `height` with `root_hash`.
    fn update_from_shard(&self, chain: ChainId, epoch: Epoch, height: BlockHeight, root_hash: Hash) -> CheckpointResult<()>;

    /// Checkpoint at or before `epoch`; `(0, zero hash)` if none.
    fn lookup_by_epoch(&self, chain: ChainId, epoch: Epoch) -> (Epoch, Hash);

    /// Checkpoint in effect at `height`.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no checkpoint old enough
    fn lookup_by_epoch_and_height(&self, chain: ChainId, epoch: Epoch, height: BlockHeight) -> CheckpointResult<(Epoch, Hash)>;

    /// Committee recorded for `epoch` (or the closest earlier one).
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no beacon root recorded at or before `epoch`
    fn committee_for_epoch(&self, chain: ChainId, epoch: Epoch) -> CheckpointResult<Vec<CommitteeKey>>;

    /// Committee members in effect at `height`.
    fn committee_at(&self, chain: ChainId, epoch: Epoch, height: BlockHeight) -> CheckpointResult<Vec<CommitteeKey>>;
}
