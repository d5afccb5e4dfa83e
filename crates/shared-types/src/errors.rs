//! # Error Types
//!
//! Errors shared across ledger subsystems.

use thiserror::Error;

/// Encoding failures for persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Loading persisted state.
    Restoring,
    /// Accepting blocks.
    Running,
    /// A fatal integrity error was raised; the node must stop.
    Halted,
}
