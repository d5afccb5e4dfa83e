//! Relay error types.

use shared_types::{BlockHeight, ShardId};
use sl_01_block_storage::StorageError;
use sl_03_committee_checkpoint::CheckpointError;
use thiserror::Error;

/// Signature verification failure for one block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Proposer {proposer} is not in the committee")]
    UnknownProposer { proposer: String },

    #[error("Signer index {index} outside committee of {size}")]
    SignerOutOfRange { index: usize, size: usize },

    #[error("Insufficient signatures: {signed} of {size}, need {required}")]
    InsufficientQuorum { signed: usize, size: usize, required: usize },

    #[error("Empty committee")]
    EmptyCommittee,
}

/// Relay errors. Verification failures are not errors: they end the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Relay from shard {shard} to itself")]
    SameShard { shard: ShardId },

    #[error("Block source failed: {message}")]
    Source { message: String },

    #[error("Undecodable next-height entry {from}->{to} at {height}: {message}")]
    CorruptNextHeight {
        from: ShardId,
        to: ShardId,
        height: BlockHeight,
        message: String,
    },

    #[error("Undecodable cross-shard progress marker ({len} bytes)")]
    CorruptProgress { len: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl RelayError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Checkpoint(e) if e.is_fatal())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
