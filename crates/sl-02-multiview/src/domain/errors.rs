//! Error types for the multiview store and height resolver.

use shared_types::{short_hex, BlockHeight, ChainId, Hash};
use sl_01_block_storage::StorageError;
use thiserror::Error;

/// Rejections from `insert`. None of them mutate the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("View for {got} inserted into {expected} store")]
    WrongChain { expected: ChainId, got: ChainId },

    #[error("View {} already tracked", short_hex(.hash))]
    DuplicateView { hash: Hash },

    #[error("Orphan view {}: parent {} is not live", short_hex(.hash), short_hex(.prev_hash))]
    OrphanView { hash: Hash, prev_hash: Hash },

    #[error("Height mismatch: parent at {parent_height}, view at {height}")]
    HeightMismatch { parent_height: BlockHeight, height: BlockHeight },
}

/// Failures from `finalize`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("View {} is not an ancestor of the best view", short_hex(.hash))]
    NotAnAncestor { hash: Hash },

    #[error("Failed to index finalized segment: {0}")]
    Storage(#[from] StorageError),
}

/// Failures from height resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Height is beyond the chain tip.
    #[error("Height {height} not found (best height {best_height})")]
    NotFound { height: BlockHeight, best_height: BlockHeight },

    /// Finalized height whose index entry is still being written. Retry.
    #[error("Height {height} finalized but not yet indexed")]
    NotYetIndexed { height: BlockHeight },

    /// Lookup failure, propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResolveError {
    /// Whether retrying the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::NotYetIndexed { .. })
    }
}

pub type InsertResult<T> = Result<T, InsertError>;
pub type FinalizeResult<T> = Result<T, FinalizeError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
