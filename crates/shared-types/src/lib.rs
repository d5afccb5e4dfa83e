//! # Shared Types Crate
//!
//! Domain entities shared by every ledger subsystem: identifiers, blocks,
//! state-root snapshots, the `View` union and the instruction wire format.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem types are defined here.
//! - **Tagged views**: beacon and shard views are variants of one enum;
//!   nothing down-casts.
//! - **Wire stability**: instructions keep their field order and decimal
//!   integer encoding.

pub mod entities;
pub mod errors;
pub mod instruction;
pub mod view;

pub use entities::*;
pub use errors::*;
pub use instruction::{
    encode_decimal, meta, parse_decimal, Instruction, LIQUIDATION_FAILED_STATUS, LIQUIDATION_SUCCESS_STATUS,
    RANDOM_ACTION, SHARE_PRICE_ACTION, STAKE_ACTION, SWAP_ACTION,
};
pub use view::{BeaconView, ShardView, View};
