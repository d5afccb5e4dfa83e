//! # Block Storage (sl-01)
//!
//! Durable storage contract for the ledger core. Everything persisted by
//! the other subsystems goes through the [`KeyValueStore`] port, which
//! assumes an ordered byte store with atomic batch writes.
//!
//! ## Key Schema
//!
//! | Prefix | Key | Value |
//! |--------|-----|-------|
//! | `b-h-` | chain, height (BE) | finalized block hash |
//! | `b-b-` | chain, hash | block bytes + CRC32 |
//! | `b-r-` | chain, hash | root snapshot |
//! | `c-cp-` | chain | checkpoint table (JSON) |
//! | `x-nh-` | from, to, height (BE) | next cross-shard info |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Atomic Writes | A logical update is one batch, all or nothing |
//! | 2 | Data Integrity | Checksum verified on every block read |
//! | 3 | Finalized Index | Height index holds finalized blocks only |
//! | 4 | Immutable Roots | Root snapshots are never overwritten |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors, stored-block envelope, key schema
//! - `ports/` - `BlockStore` API (inbound), `KeyValueStore` SPI (outbound)
//! - `adapters/` - `KvBlockStore` over any key-value store

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::KvBlockStore;
pub use domain::entities::StoredBlock;
pub use domain::errors::{KVStoreError, StorageError, StorageResult};
pub use domain::keys;
pub use ports::inbound::BlockStore;
pub use ports::outbound::{shared, BatchOperation, InMemoryKVStore, KeyValueStore, SharedKvStore};
