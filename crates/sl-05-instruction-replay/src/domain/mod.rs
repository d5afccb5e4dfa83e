//! Domain layer for instruction replay.

pub mod effects;
pub mod errors;
pub mod payloads;
pub mod reward;
pub mod share_price;
