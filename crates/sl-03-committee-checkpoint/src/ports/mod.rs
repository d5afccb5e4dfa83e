//! Ports for committee checkpoints.

pub mod inbound;
pub mod outbound;
