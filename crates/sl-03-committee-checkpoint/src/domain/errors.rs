//! Error types for the checkpoint store.

use shared_types::{short_hex, BlockHeight, ChainId, Epoch, Hash};
use sl_01_block_storage::StorageError;
use thiserror::Error;

use crate::ports::outbound::CommitteeReadError;

/// Checkpoint store errors.
///
/// `IntegrityViolation` and `CorruptTable` are fatal: the node's state views
/// disagree with each other and it must stop. See [`CheckpointError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// No checkpoint old enough for the query.
    #[error("No committee checkpoint on {chain} for epoch {epoch} at height {height}")]
    NotFound { chain: ChainId, epoch: Epoch, height: BlockHeight },

    /// Chain id outside the configured shard range.
    #[error("Unknown chain {chain}")]
    UnknownChain { chain: ChainId },

    /// Beacon-side and shard-side committees differ.
    #[error(
        "Committee mismatch on {chain} epoch {epoch}: beacon root {} has {beacon_len} members, \
         shard root {} has {shard_len} members, first difference at index {first_difference}",
        short_hex(.beacon_root),
        short_hex(.shard_root)
    )]
    IntegrityViolation {
        chain: ChainId,
        epoch: Epoch,
        beacon_root: Hash,
        shard_root: Hash,
        beacon_len: usize,
        shard_len: usize,
        first_difference: usize,
    },

    /// A shard-side height lower than an earlier epoch's, or higher than a
    /// later one's. The update is rejected.
    #[error("Checkpoint height {height} for {chain} epoch {epoch} breaks epoch order")]
    HeightOutOfOrder { chain: ChainId, epoch: Epoch, height: BlockHeight },

    /// A persisted table could not be decoded.
    #[error("Corrupt checkpoint table for {chain}: {message}")]
    CorruptTable { chain: ChainId, message: String },

    /// The committee behind a root could not be loaded.
    #[error(transparent)]
    CommitteeRead(#[from] CommitteeReadError),

    /// Persisting the table failed; the update was not applied.
    #[error("Failed to persist checkpoint table: {0}")]
    Storage(#[from] StorageError),
}

impl CheckpointError {
    /// Whether the host process must treat this as a crash condition.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckpointError::IntegrityViolation { .. } | CheckpointError::CorruptTable { .. }
        )
    }
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;
