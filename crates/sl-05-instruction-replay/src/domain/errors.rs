//! Replay error types.

use shared_types::{BlockHeight, ShardId};
use sl_03_committee_checkpoint::CheckpointError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// Committee lookup for a shard reward failed.
    #[error("Committee lookup for shard {shard} failed: {source}")]
    Committee {
        shard: ShardId,
        #[source]
        source: CheckpointError,
    },

    /// An amount left the `u64` range.
    #[error("Arithmetic overflow in {what}")]
    Overflow { what: &'static str },

    /// A percentage above 100, a score above its maximum, or a zero divisor.
    #[error("Invalid parameter {name}={value}")]
    InvalidParameter { name: &'static str, value: u64 },

    /// Reward split with no committee on either side.
    #[error("Reward split needs at least one committee member")]
    NoCommittee,

    /// Validator with delegators but no recorded share price.
    #[error("No share price for stake {stake_id}")]
    MissingSharePrice { stake_id: String },

    /// Share price update instruction could not be encoded.
    #[error("Could not encode instruction payload: {message}")]
    Encode { message: String },

    /// Same beacon height appears twice in one replay range.
    #[error("Beacon height {height} appears twice in the replay range")]
    DuplicateHeight { height: BlockHeight },
}

impl ReplayError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReplayError::Committee { source, .. } if source.is_fatal())
    }
}

pub type ReplayResult<T> = Result<T, ReplayError>;
