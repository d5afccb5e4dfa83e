//! Delegation share-price update at an epoch boundary.
//!
//! For validator `k` with `amount_k = delegators_k · staking_amount`:
//!
//! ```text
//! reward_k = R · amount_k · perf_k / (Σ amount · max_score)
//! new_k    = old_k + old_k · reward_k / amount_k
//! ```
//!
//! Computed in `U256`, each division rounding toward zero. Earlier nodes
//! did this in arbitrary-precision floating point, whose rounding was never
//! specified; results can differ from those nodes by one unit.

use primitive_types::U256;
use shared_types::{encode_decimal, parse_decimal, CommitteeKey, Instruction, SHARE_PRICE_ACTION};

use crate::domain::errors::{ReplayError, ReplayResult};

/// One beacon validator's delegation state for the finished epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorDelegation {
    pub key: CommitteeKey,
    pub stake_id: String,
    pub delegators: u64,
    /// Performance score out of `max_score`.
    pub performance: u64,
    /// Current share price; zero means none recorded.
    pub old_price: u64,
}

/// Share-price instruction for the epoch, or `None` if nobody delegated.
///
/// Validators are processed in descending key order; those without
/// delegators get no entry.
pub fn calculate_share_prices(
    validators: &[ValidatorDelegation],
    delegation_reward: u64,
    staking_amount: u64,
    max_score: u64,
) -> ReplayResult<Option<Instruction>> {
    if max_score == 0 {
        return Err(ReplayError::InvalidParameter {
            name: "max_score",
            value: max_score,
        });
    }

    let mut total = U256::zero();
    for v in validators {
        if v.old_price == 0 {
            return Err(ReplayError::MissingSharePrice {
                stake_id: v.stake_id.clone(),
            });
        }
        if v.performance > max_score {
            return Err(ReplayError::InvalidParameter {
                name: "performance",
                value: v.performance,
            });
        }
        total = total
            .checked_add(U256::from(v.delegators) * U256::from(staking_amount))
            .ok_or(ReplayError::Overflow { what: "delegated amount" })?;
    }
    if total.is_zero() {
        return Ok(None);
    }

    let mut ordered: Vec<&ValidatorDelegation> = validators.iter().collect();
    ordered.sort_by(|a, b| b.key.cmp(&a.key));

    let mut stake_ids = Vec::new();
    let mut prices = Vec::new();
    for v in ordered {
        if v.delegators == 0 {
            continue;
        }
        let amount = U256::from(v.delegators) * U256::from(staking_amount);
        let old = U256::from(v.old_price);
        let reward = checked_mul(&[U256::from(delegation_reward), amount, U256::from(v.performance)])?
            / checked_mul(&[total, U256::from(max_score)])?;
        let new_price = old + checked_mul(&[old, reward])? / amount;

        stake_ids.push(v.stake_id.clone());
        prices.push(encode_decimal(to_u64(new_price)?));
    }

    if stake_ids.is_empty() {
        return Ok(None);
    }
    Ok(Some(Instruction::new([
        SHARE_PRICE_ACTION.to_string(),
        stake_ids.join(","),
        prices.join(","),
    ])))
}

fn checked_mul(factors: &[U256]) -> ReplayResult<U256> {
    factors
        .iter()
        .try_fold(U256::one(), |acc, f| acc.checked_mul(*f))
        .ok_or(ReplayError::Overflow { what: "share price" })
}

fn to_u64(value: U256) -> ReplayResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(ReplayError::Overflow { what: "share price" });
    }
    Ok(value.low_u64())
}

/// Decode `[sharepriceupdate, "id1,id2", "p1,p2"]`.
pub fn parse_share_prices(inst: &Instruction) -> Option<Vec<(String, u64)>> {
    if inst.action() != Some(SHARE_PRICE_ACTION) || inst.len() != 3 {
        return None;
    }
    let ids: Vec<&str> = inst.field(1)?.split(',').collect();
    let prices: Vec<&str> = inst.field(2)?.split(',').collect();
    if ids.len() != prices.len() || ids.iter().any(|id| id.is_empty()) {
        return None;
    }
    ids.into_iter()
        .zip(prices)
        .map(|(id, p)| parse_decimal(p).map(|price| (id.to_string(), price)))
        .collect()
}
