//! # Shard Ledger Test Suite
//!
//! Cross-subsystem tests that drive the ledger core the way a node does.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Block builders and a ChainState harness
//! └── integration/
//!     ├── views.rs       # sl-02 MultiView + HeightResolver over sl-01 storage
//!     ├── checkpoints.rs # sl-03 lookups and the fatal integrity path
//!     ├── relay.rs       # sl-04 exactly-once, ordered delivery
//!     ├── replay.rs      # sl-05 reward conservation across shards
//!     └── lifecycle.rs   # ChainState, supervisor and prefetch together
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sl-tests
//!
//! # By area
//! cargo test -p sl-tests integration::relay::
//!
//! # Benchmarks
//! cargo bench -p sl-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
