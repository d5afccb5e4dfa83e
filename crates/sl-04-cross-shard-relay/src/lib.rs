//! # Cross-Shard Relay (sl-04)
//!
//! Delivers blocks produced on one shard to another, in height order and
//! exactly once, verified against the committee that signed them.
//!
//! ## Flow
//!
//! ```text
//! beacon block confirmed ──record_confirmed──→ (from, to, last) → next
//!                                                      │
//! shard producer ──get_relay_batch(from, to, start)────┘
//!     sort candidates ↑ by height
//!     accept only candidate == next(from, to, current), then current = candidate
//!     stop on: height cap · epoch change · swap (after it) · tx budget · verify failure
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Each height delivered at most once | next-height chase |
//! | 2 | Heights delivered in ascending order | explicit sort, chase |
//! | 3 | A batch never spans two epochs | epoch stop |
//! | 4 | A batch never continues past a swap | swap stop |
//! | 5 | Next-height entries are never overwritten | write-if-absent |

pub mod domain;
pub mod indexer;
pub mod ports;
pub mod service;

pub use domain::entities::{CrossShardPayload, NextCrossShardInfo, RelayBatch, RelayLimits, StopReason};
pub use domain::errors::{RelayError, RelayResult, VerifyError};
pub use indexer::CrossShardIndexer;
pub use ports::inbound::CrossShardRelayApi;
pub use ports::outbound::{CrossShardBlockSource, InMemoryBlockSource, QuorumVerifier, SignatureVerifier};
pub use service::CrossShardRelay;
