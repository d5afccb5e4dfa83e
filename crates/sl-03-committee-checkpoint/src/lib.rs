//! # Committee Checkpoints (sl-03)
//!
//! Per-chain, per-epoch record of `(height, committee root)` used to answer
//! "who was on the committee at height H" without replaying from genesis.
//!
//! ## Update Flow
//!
//! ```text
//! beacon observes epoch root ──update_from_beacon──┐
//!                                                  ├──→ cross-check ──→ persist table
//! shard reaches epoch boundary ──update_from_shard─┘        │
//!                                                           └─ mismatch: IntegrityViolation (fatal)
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | `epochs` sorted, no duplicates | sorted insert |
//! | 2 | Heights non-decreasing by epoch, except the sentinel | caller order, checked in tests |
//! | 3 | Beacon and shard committees agree member-for-member | cross-check on every update |
//! | 4 | Table persisted before the update is visible | write-through |

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::checkpoint::{CheckpointTable, CommitteeCheckpoint, EMPTY_ROOT, SENTINEL_HEIGHT};
pub use domain::errors::{CheckpointError, CheckpointResult};
pub use ports::inbound::CheckpointApi;
pub use ports::outbound::{CommitteeReadError, CommitteeReader, InMemoryCommitteeReader};
pub use service::CheckpointStore;
