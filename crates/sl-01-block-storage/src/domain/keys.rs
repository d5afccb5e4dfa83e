//! # Key Schema
//!
//! Heights are encoded big-endian so a prefix scan returns them in order.

use shared_types::{BlockHeight, ChainId, Hash, ShardId};

pub const FINALIZED_HEIGHT_PREFIX: &[u8] = b"b-h-";
pub const BLOCK_PREFIX: &[u8] = b"b-b-";
pub const ROOTS_PREFIX: &[u8] = b"b-r-";
pub const CHECKPOINT_PREFIX: &[u8] = b"c-cp-";
pub const CROSS_SHARD_NEXT_PREFIX: &[u8] = b"x-nh-";
/// Highest beacon height whose cross-shard links are recorded.
pub const CROSS_SHARD_PROGRESS_KEY: &[u8] = b"x-pg-";

fn with_prefix(prefix: &[u8], capacity: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + capacity);
    key.extend_from_slice(prefix);
    key
}

/// Finalized height → hash.
pub fn finalized_height_key(chain: ChainId, height: BlockHeight) -> Vec<u8> {
    let mut key = with_prefix(FINALIZED_HEIGHT_PREFIX, 9);
    key.push(chain.key_byte());
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Prefix covering every finalized height of one chain.
pub fn finalized_height_prefix(chain: ChainId) -> Vec<u8> {
    let mut key = with_prefix(FINALIZED_HEIGHT_PREFIX, 1);
    key.push(chain.key_byte());
    key
}

/// Hash → block bytes.
pub fn block_key(chain: ChainId, hash: &Hash) -> Vec<u8> {
    let mut key = with_prefix(BLOCK_PREFIX, 33);
    key.push(chain.key_byte());
    key.extend_from_slice(hash);
    key
}

/// Hash → root snapshot.
pub fn roots_key(chain: ChainId, hash: &Hash) -> Vec<u8> {
    let mut key = with_prefix(ROOTS_PREFIX, 33);
    key.push(chain.key_byte());
    key.extend_from_slice(hash);
    key
}

/// Chain → checkpoint table.
pub fn checkpoint_key(chain: ChainId) -> Vec<u8> {
    let mut key = with_prefix(CHECKPOINT_PREFIX, 1);
    key.push(chain.key_byte());
    key
}

/// `(from, to, height)` → next cross-shard info.
pub fn cross_shard_next_key(from: ShardId, to: ShardId, height: BlockHeight) -> Vec<u8> {
    let mut key = with_prefix(CROSS_SHARD_NEXT_PREFIX, 12);
    key.push(from);
    key.push(b'-');
    key.push(to);
    key.push(b'-');
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Decode the height suffix of a finalized-height key.
pub fn height_from_finalized_key(key: &[u8]) -> Option<BlockHeight> {
    let start = FINALIZED_HEIGHT_PREFIX.len() + 1;
    let bytes: [u8; 8] = key.get(start..start + 8)?.try_into().ok()?;
    Some(BlockHeight::from_be_bytes(bytes))
}
