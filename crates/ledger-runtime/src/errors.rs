//! Runtime error type: every subsystem error, one `is_fatal` question.

use shared_types::ChainId;
use sl_01_block_storage::{KVStoreError, StorageError};
use sl_02_multiview::{FinalizeError, InsertError, ResolveError};
use sl_03_committee_checkpoint::CheckpointError;
use sl_04_cross_shard_relay::RelayError;
use sl_05_instruction_replay::ReplayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No view store for {chain}")]
    UnknownChain { chain: ChainId },

    #[error(transparent)]
    Insert(#[from] InsertError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to open storage: {0}")]
    Open(#[from] KVStoreError),

    #[error("Ledger is halted after a fatal error")]
    Halted,
}

impl LedgerError {
    /// Consensus-safety violations. The process must stop.
    pub fn is_fatal(&self) -> bool {
        match self {
            LedgerError::Checkpoint(e) => e.is_fatal(),
            LedgerError::Relay(e) => e.is_fatal(),
            LedgerError::Replay(e) => e.is_fatal(),
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
