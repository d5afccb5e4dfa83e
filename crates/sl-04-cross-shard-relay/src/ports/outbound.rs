//! # Outbound Ports (Driven Ports)
//!
//! Source of pending cross-shard blocks and the committee signature check.

use parking_lot::RwLock;
use shared_types::{BlockHeight, CommitteeKey, ShardBlock, ShardId};

use crate::domain::errors::{RelayError, VerifyError};

/// Pending blocks produced by a source shard.
pub trait CrossShardBlockSource: Send + Sync {
    /// Blocks from `from_shard` addressed to `to_shard` above `above`.
    ///
    /// No ordering or uniqueness guarantee; the relay sorts and dedups.
    fn pending_blocks(&self, from_shard: ShardId, to_shard: ShardId, above: BlockHeight) -> Result<Vec<ShardBlock>, RelayError>;
}

/// Committee signature check for a cross-shard block.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, block: &ShardBlock, committee: &[CommitteeKey]) -> Result<(), VerifyError>;
}

/// Block source backed by a plain list, for tests and local runs.
#[derive(Default)]
pub struct InMemoryBlockSource {
    blocks: RwLock<Vec<ShardBlock>>,
}

impl InMemoryBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block; duplicates are kept, as a network would deliver them.
    pub fn push(&self, block: ShardBlock) {
        self.blocks.write().push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl CrossShardBlockSource for InMemoryBlockSource {
    fn pending_blocks(&self, from_shard: ShardId, to_shard: ShardId, above: BlockHeight) -> Result<Vec<ShardBlock>, RelayError> {
        Ok(self
            .blocks
            .read()
            .iter()
            .filter(|b| b.header.shard_id == from_shard && b.height() > above)
            .filter(|b| b.header.cross_shard_bitmap.contains(&to_shard))
            .cloned()
            .collect())
    }
}

/// Structural check: proposer on the committee and more than two thirds of
/// the committee listed as signers. Cryptographic checks live elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuorumVerifier;

impl QuorumVerifier {
    /// Smallest signer count strictly above two thirds.
    pub fn required(size: usize) -> usize {
        size * 2 / 3 + 1
    }
}

impl SignatureVerifier for QuorumVerifier {
    fn verify(&self, block: &ShardBlock, committee: &[CommitteeKey]) -> Result<(), VerifyError> {
        if committee.is_empty() {
            return Err(VerifyError::EmptyCommittee);
        }
        if !committee.contains(&block.header.proposer) {
            return Err(VerifyError::UnknownProposer {
                proposer: block.header.proposer.to_string(),
            });
        }

        let mut signers = block.validation_data.signer_indices.clone();
        signers.sort_unstable();
        signers.dedup();
        if let Some(&index) = signers.iter().find(|&&i| i >= committee.len()) {
            return Err(VerifyError::SignerOutOfRange {
                index,
                size: committee.len(),
            });
        }

        let required = Self::required(committee.len());
        if signers.len() < required {
            return Err(VerifyError::InsufficientQuorum {
                signed: signers.len(),
                size: committee.len(),
                required,
            });
        }
        Ok(())
    }
}
