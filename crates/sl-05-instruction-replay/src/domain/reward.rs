//! Epoch reward split and the instructions that carry it.
//!
//! ```text
//! total ──dao%──→ dao_and_custodian ──custodian%──→ custodian
//!   │                     └──────────────rest────→ dao
//!   └─ V = total - dao_and_custodian
//!        shard  = V·S·N / (S·N + 2·B)
//!        beacon = total - shard - dao_and_custodian
//! ```
//!
//! `S` shard committee size, `B` beacon committee size, `N` active shards.
//! Every quotient rounds down; `beacon` takes whatever is left, so the four
//! parts always add up to `total`.

use serde::Serialize;
use shared_types::instruction::meta;
use shared_types::{CommitteeKey, Epoch, Instruction, ShardId};

use crate::domain::errors::{ReplayError, ReplayResult};
use crate::domain::payloads::{BeaconRewardInfo, CustodianRewardInfo, DevRewardInfo, ShardRewardInfo};

pub const BEACON_REWARD_STATUS: &str = "beaconRewardInst";
pub const DEV_REWARD_STATUS: &str = "devRewardInst";
pub const SHARD_REWARD_STATUS: &str = "shardRewardInst";
pub const CUSTODIAN_REWARD_STATUS: &str = "portalRewardInst";

/// One shard-epoch reward, split four ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardSplit {
    pub beacon: u64,
    pub shard: u64,
    pub dao: u64,
    pub custodian: u64,
}

impl RewardSplit {
    pub fn total(&self) -> u128 {
        self.beacon as u128 + self.shard as u128 + self.dao as u128 + self.custodian as u128
    }
}

/// Split `total` between beacon, shard, DAO and custodians.
pub fn split_reward(
    total: u64,
    dao_percent: u64,
    custodian_percent: u64,
    shard_committee_len: usize,
    beacon_committee_len: usize,
    active_shards: u8,
) -> ReplayResult<RewardSplit> {
    check_percent("dao_percent", dao_percent)?;
    check_percent("custodian_percent", custodian_percent)?;

    let shard_weight = shard_committee_len as u128 * active_shards as u128;
    let denominator = shard_weight + 2 * beacon_committee_len as u128;
    if denominator == 0 {
        return Err(ReplayError::NoCommittee);
    }

    let dao_and_custodian = mul_div(total as u128, dao_percent as u128, 100);
    let remaining = total as u128 - dao_and_custodian;
    let shard = mul_div(remaining, shard_weight, denominator);
    let custodian = mul_div(dao_and_custodian, custodian_percent as u128, 100);
    let dao = dao_and_custodian - custodian;
    let beacon = total as u128 - shard - dao_and_custodian;

    // Each part is bounded by `total`, so the casts are lossless.
    Ok(RewardSplit {
        beacon: beacon as u64,
        shard: shard as u64,
        dao: dao as u64,
        custodian: custodian as u64,
    })
}

fn check_percent(name: &'static str, value: u64) -> ReplayResult<()> {
    if value > 100 {
        return Err(ReplayError::InvalidParameter { name, value });
    }
    Ok(())
}

fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    // a ≤ u64::MAX and b ≤ 2^72 in practice; fine in u128.
    a * b / c
}

/// Who receives each part of a [`RewardSplit`].
#[derive(Debug, Clone)]
pub struct RewardTargets {
    pub shard_id: ShardId,
    pub epoch: Epoch,
    pub beacon_committee: Vec<CommitteeKey>,
    /// Shard holding the DAO and custodian pool accounts.
    pub dao_shard: ShardId,
    pub active_shards: u8,
}

/// Render a split as the instructions replay consumes.
///
/// The beacon part is divided evenly over the beacon committee in key
/// order; the remainder goes one unit each to the first members. Zero
/// amounts produce no instruction.
pub fn reward_instructions(split: &RewardSplit, targets: &RewardTargets) -> ReplayResult<Vec<Instruction>> {
    let mut out = Vec::new();

    if split.shard > 0 {
        let info = ShardRewardInfo {
            epoch: targets.epoch,
            shard_reward: split.shard,
        };
        out.push(Instruction::meta(
            meta::SHARD_BLOCK_REWARD_REQUEST,
            targets.shard_id,
            SHARD_REWARD_STATUS,
            encode(&info)?,
        ));
    }

    if split.beacon > 0 {
        let mut committee = targets.beacon_committee.clone();
        committee.sort();
        for (member, amount) in committee.iter().zip(even_shares(split.beacon, committee.len())?) {
            if amount == 0 {
                continue;
            }
            let info = BeaconRewardInfo {
                pay_to_public_key: member.as_str().to_string(),
                beacon_reward: amount,
            };
            out.push(Instruction::meta(
                meta::BEACON_REWARD_REQUEST,
                member.shard_of(targets.active_shards),
                BEACON_REWARD_STATUS,
                encode(&info)?,
            ));
        }
    }

    if split.dao > 0 {
        out.push(Instruction::meta(
            meta::DEV_REWARD_REQUEST,
            targets.dao_shard,
            DEV_REWARD_STATUS,
            encode(&DevRewardInfo { dev_reward: split.dao })?,
        ));
    }

    if split.custodian > 0 {
        out.push(Instruction::meta(
            meta::PORTAL_CUSTODIAN_REWARD,
            targets.dao_shard,
            CUSTODIAN_REWARD_STATUS,
            encode(&CustodianRewardInfo {
                custodian_reward: split.custodian,
            })?,
        ));
    }

    Ok(out)
}

/// `amount` over `n` recipients: floor share each, remainder one unit each
/// to the first `amount % n`.
pub fn even_shares(amount: u64, n: usize) -> ReplayResult<Vec<u64>> {
    if n == 0 {
        return Err(ReplayError::NoCommittee);
    }
    let n64 = n as u64;
    let (base, remainder) = (amount / n64, amount % n64);
    Ok((0..n64).map(|i| base + u64::from(i < remainder)).collect())
}

fn encode<T: Serialize>(payload: &T) -> ReplayResult<String> {
    serde_json::to_string(payload).map_err(|e| ReplayError::Encode { message: e.to_string() })
}
