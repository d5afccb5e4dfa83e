//! # MultiView (sl-02)
//!
//! Fork tracking for one chain plus the height resolver that bridges
//! finalized storage and the tentative in-memory tail.
//!
//! ## View Lifecycle
//!
//! ```text
//! insert ──→ Live ──finalize──→ Finalized ──(newer finalize)──→ Pruned
//! ```
//!
//! No view ever regresses. Pruned views are never returned again.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Final is ancestor of best | `finalize` walks from best |
//! | 2 | `final.height <= best.height` | follows from 1 |
//! | 3 | Parent known, height = parent + 1 | `insert` |
//! | 4 | Finalized heights durably indexed before final moves | `finalize` |
//! | 5 | Single writer per chain | insertion mutex |
//!
//! ## Concurrency
//!
//! `insert` / `finalize` hold a per-chain mutex. `best_view` / `final_view`
//! are `Arc` pointers behind their own short-lived locks, so readers never
//! wait on a writer's ancestor walk.

pub mod domain;
pub mod ports;
pub mod resolver;
pub mod store;

pub use domain::errors::{FinalizeError, InsertError, ResolveError};
pub use ports::inbound::{HeightResolverApi, MultiViewApi};
pub use resolver::{HeightResolver, Resolution, ResolveSource};
pub use store::{MultiView, ViewRef};
