//! Replay accumulator.

use std::collections::BTreeMap;

use shared_types::{BlockHeight, CommitteeKey};

use crate::domain::errors::{ReplayError, ReplayResult};
use crate::domain::payloads::LiquidationContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationStatus {
    Success,
    Failed,
}

/// A custodian liquidation observed in a beacon block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationTransition {
    pub status: LiquidationStatus,
    pub beacon_height: BlockHeight,
    /// Height from which the liquidation is in force: the block after.
    pub liquidated_beacon_height: BlockHeight,
    pub content: LiquidationContent,
}

/// Everything one replay range produces for one shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Committee rewards by key, beacon and shard rewards combined.
    pub reward_credits: BTreeMap<CommitteeKey, u64>,
    /// Dev (DAO) reward.
    pub dev_reward: u64,
    /// Custodian reward pool.
    pub custodian_reward: u64,
    /// Shard rewards for epochs with no known committee members.
    pub undistributed: u64,
    /// Latest price per stake id.
    pub share_prices: BTreeMap<String, u64>,
    pub liquidations: Vec<LiquidationTransition>,
    /// Instructions skipped as malformed.
    pub malformed: usize,
    /// Highest beacon height folded in.
    pub last_beacon_height: Option<BlockHeight>,
}

impl Effects {
    pub fn credit(&mut self, key: CommitteeKey, amount: u64) -> ReplayResult<()> {
        let slot = self.reward_credits.entry(key).or_insert(0);
        *slot = checked_add(*slot, amount, "reward credit")?;
        Ok(())
    }

    pub fn add_dev(&mut self, amount: u64) -> ReplayResult<()> {
        self.dev_reward = checked_add(self.dev_reward, amount, "dev reward")?;
        Ok(())
    }

    pub fn add_custodian(&mut self, amount: u64) -> ReplayResult<()> {
        self.custodian_reward = checked_add(self.custodian_reward, amount, "custodian reward")?;
        Ok(())
    }

    pub fn add_undistributed(&mut self, amount: u64) -> ReplayResult<()> {
        self.undistributed = checked_add(self.undistributed, amount, "undistributed reward")?;
        Ok(())
    }

    /// Sum of every reward-like amount. Widened so it cannot overflow.
    pub fn total_rewards(&self) -> u128 {
        self.reward_credits.values().map(|&v| v as u128).sum::<u128>()
            + self.dev_reward as u128
            + self.custodian_reward as u128
            + self.undistributed as u128
    }

    /// Fold another shard's or range's effects into this one.
    pub fn merge(&mut self, other: Effects) -> ReplayResult<()> {
        for (key, amount) in other.reward_credits {
            self.credit(key, amount)?;
        }
        self.add_dev(other.dev_reward)?;
        self.add_custodian(other.custodian_reward)?;
        self.add_undistributed(other.undistributed)?;
        self.share_prices.extend(other.share_prices);
        self.liquidations.extend(other.liquidations);
        self.malformed += other.malformed;
        self.last_beacon_height = self.last_beacon_height.max(other.last_beacon_height);
        Ok(())
    }
}

fn checked_add(a: u64, b: u64, what: &'static str) -> ReplayResult<u64> {
    a.checked_add(b).ok_or(ReplayError::Overflow { what })
}
