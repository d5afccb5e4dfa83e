//! # Instruction Wire Format
//!
//! An instruction is an ordered tuple of strings emitted by beacon blocks:
//!
//! ```text
//! [metaTypeOrAction, shardID, statusOrPayload, ...optionalFields]
//! ```
//!
//! Integers are encoded in decimal without leading zeros. Field order is
//! part of the wire contract and must never be rearranged.

use serde::{Deserialize, Serialize};

use crate::entities::ShardId;

/// Committee swap action.
pub const SWAP_ACTION: &str = "swap";
/// Staking action.
pub const STAKE_ACTION: &str = "stake";
/// Random number action.
pub const RANDOM_ACTION: &str = "random";
/// Delegation share-price update action.
pub const SHARE_PRICE_ACTION: &str = "sharepriceupdate";

/// Numeric metadata types carried in position 0.
pub mod meta {
    pub const SHARD_BLOCK_REWARD: i32 = 36;
    pub const ACCEPTED_BLOCK_REWARD_INFO: i32 = 37;
    pub const BEACON_REWARD_REQUEST: i32 = 39;
    pub const RETURN_STAKING: i32 = 41;
    pub const DEV_REWARD_REQUEST: i32 = 42;
    pub const SHARD_BLOCK_REWARD_REQUEST: i32 = 43;
    pub const WITHDRAW_REWARD_REQUEST: i32 = 44;
    pub const WITHDRAW_REWARD_RESPONSE: i32 = 45;
    pub const PORTAL_LIQUIDATE_CUSTODIAN: i32 = 205;
    pub const PORTAL_CUSTODIAN_REWARD: i32 = 206;
}

/// Liquidation status strings carried in position 2.
pub const LIQUIDATION_SUCCESS_STATUS: &str = "success";
pub const LIQUIDATION_FAILED_STATUS: &str = "failed";

/// One beacon instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instruction(pub Vec<String>);

impl Instruction {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Build a metadata instruction: `[metaType, shardID, status, payload]`.
    pub fn meta(meta_type: i32, shard_id: ShardId, status: &str, payload: impl Into<String>) -> Self {
        Self(vec![
            meta_type.to_string(),
            encode_decimal(shard_id as u64),
            status.to_string(),
            payload.into(),
        ])
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Field 0 as written on the wire.
    pub fn action(&self) -> Option<&str> {
        self.field(0)
    }

    /// Field 0 parsed as a numeric metadata type.
    pub fn meta_type(&self) -> Option<i32> {
        self.action().and_then(|s| parse_decimal(s)).and_then(|v| i32::try_from(v).ok())
    }

    /// Field 1 parsed as a shard id.
    pub fn shard_id(&self) -> Option<ShardId> {
        self.field(1).and_then(parse_decimal).and_then(|v| ShardId::try_from(v).ok())
    }

    pub fn is_swap(&self) -> bool {
        self.action() == Some(SWAP_ACTION)
    }
}

/// Decimal encoding of an unsigned integer.
pub fn encode_decimal(value: u64) -> String {
    value.to_string()
}

/// Strict decimal parse: ASCII digits only, no sign, no leading zeros.
pub fn parse_decimal(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}
