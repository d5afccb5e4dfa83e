//! Ports for instruction replay.

pub mod inbound;
pub mod outbound;
