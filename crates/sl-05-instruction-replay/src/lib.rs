//! # Instruction Replay (sl-05)
//!
//! Scans finalized beacon blocks for instructions addressed to one shard
//! and folds them into [`Effects`]: reward credits, share-price updates and
//! liquidation transitions.
//!
//! ## Dispatch
//!
//! | Field 0 | Handling |
//! |---------|----------|
//! | `stake`, `random` | ignored |
//! | `sharepriceupdate` | prices set, every shard |
//! | `39` | beacon reward to `PayToPublicKey` |
//! | `42` | dev (DAO) reward |
//! | `43` | shard reward split over the sorted epoch committee |
//! | `205` | custodian liquidation, `success` / `failed` |
//! | `206` | custodian reward pool |
//!
//! Instructions with two fields or fewer are ignored. A malformed
//! instruction is logged, counted and skipped; the rest of the range still
//! replays.
//!
//! ## Arithmetic
//!
//! All amounts are integers. Every division rounds toward zero and any
//! remainder is assigned explicitly, so credits always sum to the input.
//!
//! ## Idempotence
//!
//! The engine holds no replay state. Callers track applied heights with
//! [`AppliedHeights`] so a range is never credited twice.

pub mod domain;
pub mod ledger;
pub mod ports;
pub mod service;

pub use domain::effects::{Effects, LiquidationStatus, LiquidationTransition};
pub use domain::errors::{ReplayError, ReplayResult};
pub use domain::payloads::{BeaconRewardInfo, CustodianRewardInfo, DevRewardInfo, LiquidationContent, ShardRewardInfo};
pub use domain::reward::{reward_instructions, split_reward, RewardSplit, RewardTargets};
pub use domain::share_price::{calculate_share_prices, parse_share_prices, ValidatorDelegation};
pub use ledger::AppliedHeights;
pub use ports::inbound::ReplayApi;
pub use ports::outbound::{CheckpointCommittees, EpochCommitteeSource, InMemoryEpochCommittees};
pub use service::ReplayEngine;
