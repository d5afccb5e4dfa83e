//! # Ledger Runtime Library
//!
//! Owns one node's ledger state and the glue around it. The binary in
//! `main.rs` wires it to configuration, telemetry and signals.
//!
//! ## Modules
//!
//! - `config` - file and environment configuration
//! - `chain_state` - the owned `ChainState`
//! - `supervisor` - fatal error handling and the abort decision
//! - `prefetch` - cancellable propose-cycle prefetch workers
//! - `adapters/` - storage backends

pub mod adapters;
pub mod chain_state;
pub mod config;
pub mod errors;
pub mod prefetch;
pub mod supervisor;

pub use chain_state::{ChainState, Collaborators, Genesis};
pub use config::{ConfigError, LedgerConfig};
pub use errors::{LedgerError, LedgerResult};
pub use prefetch::{BeaconBlockFeed, PendingTxFeed, PrefetchError, PrefetchHandle, PrefetchQueues, PrefetchStats};
pub use supervisor::{AbortReason, Decision, Supervisor, EXIT_INTEGRITY_VIOLATION};
