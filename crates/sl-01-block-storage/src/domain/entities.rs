//! # Stored Block Envelope
//!
//! Blocks are written as `bincode(block) ++ crc32(bincode(block))`.

use serde::{Deserialize, Serialize};
use shared_types::{BeaconBlock, BlockHeight, ChainId, Hash, ShardBlock, ValidationData};

use super::errors::{StorageError, StorageResult};

/// A block of either chain kind as kept in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredBlock {
    Beacon(BeaconBlock),
    Shard(ShardBlock),
}

impl StoredBlock {
    pub fn hash(&self) -> Hash {
        match self {
            StoredBlock::Beacon(b) => b.hash(),
            StoredBlock::Shard(b) => b.hash(),
        }
    }

    pub fn height(&self) -> BlockHeight {
        match self {
            StoredBlock::Beacon(b) => b.header.height,
            StoredBlock::Shard(b) => b.header.height,
        }
    }

    pub fn prev_hash(&self) -> Hash {
        match self {
            StoredBlock::Beacon(b) => b.header.prev_hash,
            StoredBlock::Shard(b) => b.header.prev_hash,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            StoredBlock::Beacon(_) => ChainId::Beacon,
            StoredBlock::Shard(b) => ChainId::Shard(b.header.shard_id),
        }
    }

    pub fn validation_data(&self) -> &ValidationData {
        match self {
            StoredBlock::Beacon(b) => &b.validation_data,
            StoredBlock::Shard(b) => &b.validation_data,
        }
    }

    pub fn into_shard(self) -> Option<ShardBlock> {
        match self {
            StoredBlock::Shard(b) => Some(b),
            StoredBlock::Beacon(_) => None,
        }
    }

    pub fn into_beacon(self) -> Option<BeaconBlock> {
        match self {
            StoredBlock::Beacon(b) => Some(b),
            StoredBlock::Shard(_) => None,
        }
    }

    /// Encode with a trailing CRC32 checksum.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        let mut bytes = bincode::serialize(self)?;
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());
        Ok(bytes)
    }

    /// Decode and verify the trailing checksum.
    pub fn decode(hash: &Hash, bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() < 4 {
            return Err(StorageError::SerializationError {
                message: format!("stored block too short: {} bytes", bytes.len()),
            });
        }
        let (body, tail) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let actual = crc32fast::hash(body);
        if expected != actual {
            return Err(StorageError::DataCorruption {
                hash: *hash,
                expected,
                actual,
            });
        }
        Ok(bincode::deserialize(body)?)
    }
}
