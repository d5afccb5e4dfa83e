//! Domain layer for the cross-shard relay.

pub mod entities;
pub mod errors;
