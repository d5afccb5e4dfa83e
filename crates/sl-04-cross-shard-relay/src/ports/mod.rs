//! Ports for the cross-shard relay.

pub mod inbound;
pub mod outbound;
