//! # Replay Engine
//!
//! Stateless fold over beacon instructions for one shard.

use std::sync::Arc;

use shared_types::{
    meta, BeaconBlock, BlockHeight, CommitteeKey, Epoch, Instruction, ShardId, LIQUIDATION_FAILED_STATUS,
    LIQUIDATION_SUCCESS_STATUS, RANDOM_ACTION, SHARE_PRICE_ACTION, STAKE_ACTION,
};
use sl_03_committee_checkpoint::CheckpointError;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::effects::{Effects, LiquidationStatus, LiquidationTransition};
use crate::domain::errors::{ReplayError, ReplayResult};
use crate::domain::payloads::{BeaconRewardInfo, CustodianRewardInfo, DevRewardInfo, LiquidationContent, ShardRewardInfo};
use crate::domain::reward::even_shares;
use crate::domain::share_price::parse_share_prices;
use crate::ports::inbound::ReplayApi;
use crate::ports::outbound::EpochCommitteeSource;

/// Replay engine for one shard.
pub struct ReplayEngine {
    shard_id: ShardId,
    committees: Arc<dyn EpochCommitteeSource>,
}

/// Sorted shard committee of the epoch last looked up.
type CommitteeCache = Option<(Epoch, Vec<CommitteeKey>)>;

impl ReplayEngine {
    pub fn new(shard_id: ShardId, committees: Arc<dyn EpochCommitteeSource>) -> Self {
        Self { shard_id, committees }
    }

    pub fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    fn apply(&self, height: BlockHeight, inst: &Instruction, fx: &mut Effects, cache: &mut CommitteeCache) -> ReplayResult<()> {
        let Some(action) = inst.action() else {
            return Ok(());
        };
        if action == STAKE_ACTION || action == RANDOM_ACTION || inst.len() <= 2 {
            return Ok(());
        }

        if action == SHARE_PRICE_ACTION {
            match parse_share_prices(inst) {
                Some(prices) => fx.share_prices.extend(prices),
                None => malformed(fx, height, inst, "share price lists"),
            }
            return Ok(());
        }

        // Non-numeric actions (swap, assign, ...) are not replayed here.
        let Some(meta_type) = inst.meta_type() else {
            return Ok(());
        };
        let Some(shard) = inst.shard_id() else {
            malformed(fx, height, inst, "shard id");
            return Ok(());
        };
        if shard != self.shard_id {
            return Ok(());
        }

        match meta_type {
            meta::BEACON_REWARD_REQUEST => {
                if let Some(info) = payload::<BeaconRewardInfo>(fx, height, inst) {
                    fx.credit(CommitteeKey::new(info.pay_to_public_key), info.beacon_reward)?;
                }
            }
            meta::DEV_REWARD_REQUEST => {
                if let Some(info) = payload::<DevRewardInfo>(fx, height, inst) {
                    fx.add_dev(info.dev_reward)?;
                }
            }
            meta::SHARD_BLOCK_REWARD_REQUEST => {
                if let Some(info) = payload::<ShardRewardInfo>(fx, height, inst) {
                    self.share_shard_reward(info, fx, cache)?;
                }
            }
            meta::PORTAL_CUSTODIAN_REWARD => {
                if let Some(info) = payload::<CustodianRewardInfo>(fx, height, inst) {
                    fx.add_custodian(info.custodian_reward)?;
                }
            }
            meta::PORTAL_LIQUIDATE_CUSTODIAN => {
                let status = match inst.field(2) {
                    Some(LIQUIDATION_SUCCESS_STATUS) => LiquidationStatus::Success,
                    Some(LIQUIDATION_FAILED_STATUS) => LiquidationStatus::Failed,
                    _ => {
                        malformed(fx, height, inst, "liquidation status");
                        return Ok(());
                    }
                };
                if let Some(mut content) = payload::<LiquidationContent>(fx, height, inst) {
                    content.beacon_height = height;
                    fx.liquidations.push(LiquidationTransition {
                        status,
                        beacon_height: height,
                        liquidated_beacon_height: height.saturating_add(1),
                        content,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Even split over the sorted epoch committee.
    fn share_shard_reward(&self, info: ShardRewardInfo, fx: &mut Effects, cache: &mut CommitteeCache) -> ReplayResult<()> {
        let cached = matches!(cache, Some((epoch, _)) if *epoch == info.epoch);
        if !cached {
            let mut members = match self.committees.shard_committee(self.shard_id, info.epoch) {
                Ok(members) => members,
                Err(CheckpointError::NotFound { .. }) => Vec::new(),
                Err(source) => {
                    return Err(ReplayError::Committee {
                        shard: self.shard_id,
                        source,
                    })
                }
            };
            members.sort();
            *cache = Some((info.epoch, members));
        }

        let members = cache.as_ref().map(|(_, m)| m.as_slice()).unwrap_or_default();
        if members.is_empty() {
            warn!(
                "[sl-05] shard {} epoch {}: no committee, {} left undistributed",
                self.shard_id, info.epoch, info.shard_reward
            );
            return fx.add_undistributed(info.shard_reward);
        }
        for (member, amount) in members.iter().zip(even_shares(info.shard_reward, members.len())?) {
            fx.credit(member.clone(), amount)?;
        }
        Ok(())
    }
}

impl ReplayApi for ReplayEngine {
    fn replay(&self, blocks: &[BeaconBlock]) -> ReplayResult<Effects> {
        let mut ordered: Vec<&BeaconBlock> = blocks.iter().collect();
        ordered.sort_by_key(|b| b.height());
        if let Some(pair) = ordered.windows(2).find(|w| w[0].height() == w[1].height()) {
            return Err(ReplayError::DuplicateHeight { height: pair[0].height() });
        }

        let mut fx = Effects::default();
        let mut cache: CommitteeCache = None;
        for block in ordered {
            for inst in &block.instructions {
                self.apply(block.height(), inst, &mut fx, &mut cache)?;
            }
            fx.last_beacon_height = Some(block.height());
        }

        debug!(
            "[sl-05] shard {} replayed {} blocks: {} credits, {} liquidations, {} malformed",
            self.shard_id,
            blocks.len(),
            fx.reward_credits.len(),
            fx.liquidations.len(),
            fx.malformed
        );
        Ok(fx)
    }
}

fn payload<T: DeserializeOwned>(fx: &mut Effects, height: BlockHeight, inst: &Instruction) -> Option<T> {
    match inst.field(3).map(serde_json::from_str::<T>) {
        Some(Ok(value)) => Some(value),
        Some(Err(_)) | None => {
            malformed(fx, height, inst, "payload");
            None
        }
    }
}

fn malformed(fx: &mut Effects, height: BlockHeight, inst: &Instruction, what: &str) {
    fx.malformed += 1;
    warn!(
        "[sl-05] beacon {}: skipping instruction {:?} with bad {}",
        height,
        inst.action().unwrap_or_default(),
        what
    );
}
