//! Ports for the multiview store.
//!
//! The outbound dependency is `sl_01_block_storage::BlockStore`.

pub mod inbound;
