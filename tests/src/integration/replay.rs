//! # Instruction Replay
//!
//! Epoch rewards are split, rendered as beacon instructions, finalized on
//! the beacon chain and replayed by every shard. Together the shards must
//! credit exactly what was split, once.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared_types::{BeaconBlock, ChainId, CommitteeKey, Instruction, ShardId};
    use sl_05_instruction_replay::{
        calculate_share_prices, reward_instructions, split_reward, Effects, RewardTargets, ValidatorDelegation,
    };

    use crate::fixtures::{keys, TestNode};

    const SHARDS: u8 = 3;
    const REWARD_SHARD: ShardId = 1;
    const EPOCH: u64 = 4;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn shard_committee() -> Vec<CommitteeKey> {
        keys(&["s-a", "s-b", "s-c", "s-d"])
    }

    fn beacon_committee(n: usize) -> Vec<CommitteeKey> {
        (0..n).map(|i| CommitteeKey::new(format!("beacon-{i}"))).collect()
    }

    fn node_with_committee() -> TestNode {
        let node = TestNode::open(SHARDS);
        node.seal_committee(ChainId::Shard(REWARD_SHARD), EPOCH, 0, shard_committee()).unwrap();
        node
    }

    /// Instructions paying `total` for the reward shard at `EPOCH`.
    fn epoch_reward(node: &TestNode, total: u64, beacon_len: usize) -> Vec<Instruction> {
        let rewards = &node.state.config().rewards;
        let split = split_reward(
            total,
            rewards.dao_percent,
            rewards.effective_custodian_percent(),
            shard_committee().len(),
            beacon_len,
            SHARDS,
        )
        .unwrap();
        assert_eq!(split.total(), total as u128);

        let targets = RewardTargets {
            shard_id: REWARD_SHARD,
            epoch: EPOCH,
            beacon_committee: beacon_committee(beacon_len),
            dao_shard: 0,
            active_shards: SHARDS,
        };
        reward_instructions(&split, &targets).unwrap()
    }

    fn replay_everywhere(node: &TestNode, blocks: &[BeaconBlock]) -> Effects {
        let mut total = Effects::default();
        for shard in 0..SHARDS {
            total.merge(node.state.replay_for_shard(shard, blocks).unwrap()).unwrap();
        }
        total
    }

    // =============================================================================
    // CONSERVATION
    // =============================================================================

    #[test]
    fn test_epoch_reward_conserved_across_shards() {
        let node = node_with_committee();
        let block = node.finalize_beacon(Default::default(), epoch_reward(&node, 1_000_003, 5)).unwrap();

        let fx = replay_everywhere(&node, &[block]);
        assert_eq!(fx.total_rewards(), 1_000_003);
        assert_eq!(fx.undistributed, 0);
        assert_eq!(fx.malformed, 0);
        assert!(fx.dev_reward > 0);
        assert!(fx.custodian_reward > 0);
        for member in shard_committee() {
            assert!(fx.reward_credits.contains_key(&member));
        }
    }

    #[test]
    fn test_replay_credits_each_block_once() {
        let node = node_with_committee();
        let first = node.finalize_beacon(Default::default(), epoch_reward(&node, 900, 2)).unwrap();
        let once = replay_everywhere(&node, &[first.clone()]);
        assert_eq!(once.total_rewards(), 900);

        // A retry over an overlapping range only picks up the new block.
        let second = node.finalize_beacon(Default::default(), epoch_reward(&node, 100, 2)).unwrap();
        let again = replay_everywhere(&node, &[first, second]);
        assert_eq!(again.total_rewards(), 100);
    }

    #[test]
    fn test_unknown_epoch_reward_is_kept_not_lost() {
        let node = TestNode::open(SHARDS);
        let block = node.finalize_beacon(Default::default(), epoch_reward(&node, 5_000, 3)).unwrap();

        let fx = replay_everywhere(&node, &[block]);
        assert_eq!(fx.total_rewards(), 5_000);
        assert!(fx.undistributed > 0);
        assert!(!node.state.supervisor().is_halted());
    }

    #[test]
    fn test_share_prices_reach_every_shard() {
        let node = TestNode::open(SHARDS);
        let validators = vec![
            ValidatorDelegation {
                key: CommitteeKey::new("a"),
                stake_id: "stake-a".to_string(),
                delegators: 1,
                performance: 1,
                old_price: 7,
            },
            ValidatorDelegation {
                key: CommitteeKey::new("b"),
                stake_id: "stake-b".to_string(),
                delegators: 2,
                performance: 0,
                old_price: 5,
            },
        ];
        let inst = calculate_share_prices(&validators, 10, 1, 1).unwrap().unwrap();
        let block = node.finalize_beacon(Default::default(), vec![inst]).unwrap();

        for shard in 0..SHARDS {
            let fx = node.state.replay_for_shard(shard, &[block.clone()]).unwrap();
            assert_eq!(fx.share_prices.get("stake-a"), Some(&28));
            assert_eq!(fx.share_prices.get("stake-b"), Some(&5));
        }
    }

    #[test]
    fn test_malformed_instructions_counted_in_metrics() {
        let node = TestNode::open(SHARDS);
        let bad = Instruction::new(["42", "0", "devRewardInst", "{oops"]);
        let block = node.finalize_beacon(Default::default(), vec![bad]).unwrap();

        let fx = node.state.replay_for_shard(0, &[block]).unwrap();
        assert_eq!(fx.malformed, 1);
        assert_eq!(node.state.metrics().malformed_instructions.get(), 1);
    }

    // =============================================================================
    // PROPERTY: REWARD CONSERVATION
    // =============================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_rewards_sum_to_epoch_total(
            totals in prop::collection::vec(0u64..=u64::MAX / 16, 1..4),
            beacon_len in 1usize..9,
        ) {
            let node = node_with_committee();
            let mut blocks = Vec::new();
            for &total in &totals {
                blocks.push(node.finalize_beacon(Default::default(), epoch_reward(&node, total, beacon_len)).unwrap());
            }

            let fx = replay_everywhere(&node, &blocks);
            let expected: u128 = totals.iter().map(|&t| t as u128).sum();
            prop_assert_eq!(fx.total_rewards(), expected);
            prop_assert_eq!(fx.undistributed, 0);
        }
    }
}
