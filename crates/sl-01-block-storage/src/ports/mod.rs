//! Ports for block storage.

pub mod inbound;
pub mod outbound;
