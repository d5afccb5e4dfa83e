//! # Node Lifecycle
//!
//! `ChainState` across restarts, the supervisor's abort channel, and one
//! propose cycle driven by the prefetch workers.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use ledger_runtime::{
        BeaconBlockFeed, ChainState, Collaborators, Genesis, LedgerConfig, PendingTxFeed, PrefetchHandle,
    };
    use ledger_telemetry::LedgerMetrics;
    use parking_lot::RwLock;
    use shared_types::{BeaconBlock, BlockHeight, ChainId, Instruction, NodeState, ShardId, TxRecord};
    use sl_01_block_storage::{keys, shared, InMemoryKVStore, KeyValueStore, SharedKvStore};
    use sl_03_committee_checkpoint::{CheckpointApi, InMemoryCommitteeReader};
    use sl_04_cross_shard_relay::{InMemoryBlockSource, QuorumVerifier};
    use tokio::time::timeout;

    use crate::fixtures::{keys as committee, root, TestNode};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn open_on(kv: SharedKvStore, reader: Arc<InMemoryCommitteeReader>) -> ledger_runtime::LedgerResult<ChainState> {
        let mut config = LedgerConfig::default();
        config.chain.active_shards = 2;
        let collaborators = Collaborators {
            kv,
            committee_reader: reader,
            block_source: Arc::new(InMemoryBlockSource::new()),
            verifier: Arc::new(QuorumVerifier),
        };
        ChainState::open(config, Genesis::empty(2), collaborators, LedgerMetrics::new().unwrap())
    }

    /// Serves the beacon blocks a test node has finalized.
    struct FinalizedBeaconFeed {
        blocks: RwLock<Vec<BeaconBlock>>,
    }

    #[async_trait]
    impl BeaconBlockFeed for FinalizedBeaconFeed {
        async fn beacon_blocks_after(&self, height: BlockHeight, limit: usize) -> Vec<BeaconBlock> {
            self.blocks
                .read()
                .iter()
                .filter(|b| b.height() > height)
                .take(limit)
                .cloned()
                .collect()
        }
    }

    struct NoPendingTxs;

    #[async_trait]
    impl PendingTxFeed for NoPendingTxs {
        async fn pending_transactions(&self, _shard: ShardId, _limit: usize) -> Vec<TxRecord> {
            Vec::new()
        }
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[test]
    fn test_checkpoints_survive_restart() {
        let kv = shared(InMemoryKVStore::new());
        let reader = Arc::new(InMemoryCommitteeReader::new());
        let chain = ChainId::Shard(1);
        reader.set_beacon_committee(chain, root(0xB0, 3), committee(&["a", "b"]));
        reader.set_shard_committee(chain, root(0x50, 3), committee(&["a", "b"]));

        {
            let state = open_on(kv.clone(), reader.clone()).unwrap();
            state.update_committee_from_beacon(chain, 3, root(0xB0, 3)).unwrap();
            state.update_committee_from_shard(chain, 3, 120, root(0x50, 3)).unwrap();
            state.shutdown();
        }

        let state = open_on(kv, reader).unwrap();
        assert_eq!(
            state.checkpoints().lookup_by_epoch_and_height(chain, 5, 130).unwrap(),
            (3, root(0xB0, 3))
        );
        assert_eq!(state.supervisor().state(), NodeState::Running);
    }

    #[test]
    fn test_corrupt_checkpoint_table_refuses_to_open() {
        let kv = shared(InMemoryKVStore::new());
        kv.write()
            .put(&keys::checkpoint_key(ChainId::Shard(0)), b"not a table")
            .unwrap();

        let err = open_on(kv, Arc::new(InMemoryCommitteeReader::new())).err().unwrap();
        assert!(err.is_fatal());
    }

    // =============================================================================
    // SUPERVISOR
    // =============================================================================

    #[tokio::test]
    async fn test_abort_channel_wakes_the_run_loop() {
        let node = TestNode::open(2);
        let mut abort = node.state.supervisor().subscribe();

        let chain = ChainId::Shard(0);
        node.seal_committee(chain, 1, 0, committee(&["a", "b", "c"])).unwrap();
        assert!(node
            .seal_committees(chain, 2, 10, committee(&["a", "b", "c"]), committee(&["a", "b", "x"]))
            .is_err());

        timeout(Duration::from_secs(1), abort.changed()).await.unwrap().unwrap();
        let reason = abort.borrow().clone().unwrap();
        assert_eq!(reason.exit_code, 70);
        assert_eq!(reason.component, "checkpoint");
    }

    #[tokio::test]
    async fn test_shutdown_reaches_subscribers() {
        let node = TestNode::open(1);
        let mut signal = node.state.shutdown_signal();
        node.state.shutdown();
        timeout(Duration::from_secs(1), signal.changed()).await.unwrap().unwrap();
        assert!(*signal.borrow());
    }

    // =============================================================================
    // PROPOSE CYCLE
    // =============================================================================

    #[tokio::test]
    async fn test_prefetch_then_replay_cycle() {
        let node = TestNode::open(2);
        let mut finalized = Vec::new();
        for amount in [5u64, 7, 11] {
            let dev = Instruction::new([
                "42".to_string(),
                "0".to_string(),
                "devRewardInst".to_string(),
                format!(r#"{{"DevReward":{amount}}}"#),
            ]);
            finalized.push(node.finalize_beacon(Default::default(), vec![dev]).unwrap());
        }
        let feed = Arc::new(FinalizedBeaconFeed {
            blocks: RwLock::new(finalized),
        });

        let config = node.state.config().prefetch.clone();
        let (handle, mut queues) = PrefetchHandle::start(&config, 0, 1, feed, Arc::new(NoPendingTxs));

        let mut fetched = Vec::new();
        while let Some(block) = timeout(Duration::from_secs(1), queues.beacon_blocks.recv()).await.unwrap() {
            fetched.push(block);
            if fetched.len() == 3 {
                break;
            }
        }
        // The cycle ends: stop the workers and wait for them before reuse.
        handle.cancel();
        let stats = handle.join().await.unwrap();
        assert_eq!(stats.beacon_blocks, 3);
        assert_eq!(stats.transactions, 0);

        let fx = node.state.replay_for_shard(0, &fetched).unwrap();
        assert_eq!(fx.dev_reward, 23);
        assert_eq!(fx.last_beacon_height, Some(node.beacon_tip().height()));
    }
}
