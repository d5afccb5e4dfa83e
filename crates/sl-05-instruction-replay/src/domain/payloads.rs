//! JSON payloads carried in field 3 of reward and portal instructions.
//!
//! Field names match what peers already put on the wire.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, Epoch, ShardId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRewardInfo {
    #[serde(rename = "PayToPublicKey")]
    pub pay_to_public_key: String,
    #[serde(rename = "BeaconReward")]
    pub beacon_reward: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevRewardInfo {
    #[serde(rename = "DevReward")]
    pub dev_reward: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRewardInfo {
    #[serde(rename = "Epoch")]
    pub epoch: Epoch,
    #[serde(rename = "ShardReward")]
    pub shard_reward: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianRewardInfo {
    #[serde(rename = "CustodianReward")]
    pub custodian_reward: u64,
}

/// Body of a custodian liquidation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationContent {
    #[serde(rename = "UniqueRedeemID")]
    pub unique_redeem_id: String,
    #[serde(rename = "TokenID")]
    pub token_id: String,
    #[serde(rename = "RedeemPubTokenAmount")]
    pub redeem_pub_token_amount: u64,
    #[serde(rename = "MintedCollateralAmount")]
    pub minted_collateral_amount: u64,
    #[serde(rename = "RedeemerIncAddressStr")]
    pub redeemer_address: String,
    #[serde(rename = "CustodianIncAddressStr")]
    pub custodian_address: String,
    #[serde(rename = "ShardID")]
    pub shard_id: ShardId,
    #[serde(rename = "LiquidatedByExchangeRate", default)]
    pub liquidated_by_exchange_rate: bool,
    /// Set during replay, never read from the wire.
    #[serde(skip)]
    pub beacon_height: BlockHeight,
}
