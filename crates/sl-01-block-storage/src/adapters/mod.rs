//! Adapters implementing the block storage API.

mod kv_block_store;

pub use kv_block_store::KvBlockStore;
