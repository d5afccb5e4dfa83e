//! # Cross-Shard Relay
//!
//! Delivery from shard 0 to shard 1 through a running `ChainState`:
//!
//! ```text
//! shard block ──deliver──→ InMemoryBlockSource ──┐
//!      │                                         ├──→ relay_batch(0, 1, h)
//!      └──confirm──→ final beacon ──→ indexer ───┘
//! ```

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use ledger_runtime::{LedgerConfig, LedgerError};
    use shared_types::{ChainId, Instruction, ShardBlock, ShardState, SWAP_ACTION};
    use sl_01_block_storage::{keys, BatchOperation, InMemoryKVStore, KVStoreError, KeyValueStore};
    use sl_04_cross_shard_relay::{RelayBatch, StopReason};

    use crate::fixtures::{beacon_child, cross_shard_block, relay_committee, TestNode};

    const FROM: u8 = 0;
    const TO: u8 = 1;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn relay_node(config: LedgerConfig) -> TestNode {
        let node = TestNode::with_config(config);
        node.seal_committee(ChainId::Shard(FROM), 1, 0, relay_committee()).unwrap();
        node
    }

    fn default_node() -> TestNode {
        let mut config = LedgerConfig::default();
        config.chain.active_shards = 2;
        relay_node(config)
    }

    fn blocks_at(heights: &[u64]) -> Vec<ShardBlock> {
        heights.iter().map(|&h| cross_shard_block(FROM, TO, h, 1, 2)).collect()
    }

    /// Confirm on beacon, then deliver in the given order.
    fn publish(node: &TestNode, blocks: &[ShardBlock]) {
        node.confirm(FROM, blocks).unwrap();
        for block in blocks {
            node.deliver(block);
        }
    }

    fn heights(batch: &RelayBatch) -> Vec<u64> {
        batch.payloads.iter().map(|p| p.height).collect()
    }

    fn states_of(blocks: &[ShardBlock]) -> BTreeMap<u8, Vec<ShardState>> {
        let states = blocks
            .iter()
            .map(|b| ShardState {
                height: b.height(),
                hash: b.hash(),
                cross_shard: b.header.cross_shard_bitmap.clone(),
                tx_count: b.transactions.len() as u64,
            })
            .collect();
        BTreeMap::from([(FROM, states)])
    }

    /// Rejects batches that write cross-shard links while `failing` is set.
    struct LinkFailingStore {
        inner: InMemoryKVStore,
        failing: Arc<AtomicBool>,
    }

    impl KeyValueStore for LinkFailingStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
            self.inner.get(key)
        }

        fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
            self.inner.put(key, value)
        }

        fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
            self.inner.delete(key)
        }

        fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
            let writes_link = operations.iter().any(|op| match op {
                BatchOperation::Put { key, .. } | BatchOperation::Delete { key } => {
                    key.starts_with(keys::CROSS_SHARD_NEXT_PREFIX)
                }
            });
            if writes_link && self.failing.load(Ordering::SeqCst) {
                return Err(KVStoreError::IOError {
                    message: "disk hiccup".to_string(),
                });
            }
            self.inner.atomic_batch_write(operations)
        }

        fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
            self.inner.exists(key)
        }

        fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
            self.inner.prefix_scan(prefix)
        }
    }

    // =============================================================================
    // EXACTLY ONCE, IN ORDER
    // =============================================================================

    #[test]
    fn test_duplicate_delivery_relays_once() {
        let node = default_node();
        let block = cross_shard_block(FROM, TO, 3, 1, 2);
        node.confirm(FROM, std::slice::from_ref(&block)).unwrap();
        node.deliver(&block);
        node.deliver(&block);

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![3]);
        assert_eq!(batch.next_start_height, 3);
        assert_eq!(batch.payloads[0].transactions.len(), 2);

        // The cursor advanced once; nothing is left past it.
        let indexer = node.state.indexer();
        assert_eq!(indexer.fetch_next_height(FROM, TO, 0).unwrap().unwrap().next_height, 3);
        assert!(indexer.fetch_next_height(FROM, TO, 3).unwrap().is_none());

        let again = node.state.relay_batch(FROM, TO, batch.next_start_height).unwrap();
        assert!(again.payloads.is_empty());
        assert_eq!(again.next_start_height, 3);
    }

    #[test]
    fn test_duplicate_in_the_middle_is_skipped() {
        let node = default_node();
        let blocks = blocks_at(&[2, 4, 6]);
        publish(&node, &blocks);
        node.deliver(&blocks[1]);

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![2, 4, 6]);
        assert_eq!(batch.skipped, 1);
        assert_eq!(
            node.state.metrics().relay_blocks.with_label_values(&["accepted"]).get(),
            3
        );
    }

    #[test]
    fn test_unordered_delivery_is_relayed_ascending() {
        let node = default_node();
        let blocks = blocks_at(&[2, 5, 9]);
        node.confirm(FROM, &blocks).unwrap();
        for block in blocks.iter().rev() {
            node.deliver(block);
        }

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![2, 5, 9]);
        assert_eq!(batch.stop_reason, StopReason::Exhausted);
    }

    #[test]
    fn test_unconfirmed_block_waits() {
        let node = default_node();
        let confirmed = blocks_at(&[2]);
        publish(&node, &confirmed);
        // Delivered but not yet carried by a final beacon block.
        node.deliver(&cross_shard_block(FROM, TO, 4, 1, 1));

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![2]);

        node.confirm(FROM, &blocks_at(&[4])).unwrap();
        let batch = node.state.relay_batch(FROM, TO, 2).unwrap();
        assert_eq!(heights(&batch), vec![4]);
    }

    // =============================================================================
    // BATCH BOUNDARIES
    // =============================================================================

    #[test]
    fn test_swap_block_ends_the_batch() {
        let node = default_node();
        let mut blocks = blocks_at(&[2, 4, 6, 8]);
        blocks[1]
            .instructions
            .push(Instruction::new([SWAP_ACTION, "p4", "p3", "shard", "0"]));
        publish(&node, &blocks);

        let first = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&first), vec![2, 4]);
        assert_eq!(first.stop_reason, StopReason::SwapInstruction);

        let second = node.state.relay_batch(FROM, TO, first.next_start_height).unwrap();
        assert_eq!(heights(&second), vec![6, 8]);
    }

    #[test]
    fn test_height_cap_limits_batch() {
        let mut config = LedgerConfig::default();
        config.chain.active_shards = 2;
        config.relay.max_s2b_blocks = 2;
        let node = relay_node(config);
        publish(&node, &blocks_at(&[1, 2, 3, 4, 5]));

        let mut start = 0;
        let mut seen = Vec::new();
        loop {
            let batch = node.state.relay_batch(FROM, TO, start).unwrap();
            if batch.payloads.is_empty() {
                break;
            }
            assert!(batch.payloads.len() <= 2);
            seen.extend(heights(&batch));
            start = batch.next_start_height;
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_epoch_change_ends_the_batch() {
        let node = default_node();
        let mut blocks = blocks_at(&[2, 3]);
        blocks.push(cross_shard_block(FROM, TO, 4, 2, 1));
        publish(&node, &blocks);

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![2, 3]);
        assert_eq!(batch.stop_reason, StopReason::EpochChange);

        let next = node.state.relay_batch(FROM, TO, 3).unwrap();
        assert_eq!(heights(&next), vec![4]);
        assert_eq!(next.payloads[0].epoch, 2);
    }

    #[test]
    fn test_under_signed_block_stops_relay() {
        let node = default_node();
        let mut blocks = blocks_at(&[2, 3]);
        blocks[1].validation_data.signer_indices = vec![0];
        publish(&node, &blocks);

        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![2]);
        assert_eq!(batch.stop_reason, StopReason::VerifyFailed);
        assert!(!node.state.supervisor().is_halted());
    }

    // =============================================================================
    // STORAGE FAILURES
    // =============================================================================

    #[test]
    fn test_failed_link_write_is_recovered_on_retry() {
        let failing = Arc::new(AtomicBool::new(false));
        let store = LinkFailingStore {
            inner: InMemoryKVStore::new(),
            failing: failing.clone(),
        };
        let mut config = LedgerConfig::default();
        config.chain.active_shards = 2;
        let node = TestNode::with_store(config, Arc::new(parking_lot::RwLock::new(store)));
        node.seal_committee(ChainId::Shard(FROM), 1, 0, relay_committee()).unwrap();

        let first = cross_shard_block(FROM, TO, 7, 1, 2);
        let b2 = beacon_child(&node.genesis.beacon, states_of(std::slice::from_ref(&first)), Vec::new());
        node.state.accept_beacon_block(&b2).unwrap();

        failing.store(true, Ordering::SeqCst);
        let err = node.state.finalize(ChainId::Beacon, &b2.hash()).unwrap_err();
        assert!(matches!(err, LedgerError::Relay(_)));
        assert!(!node.state.supervisor().is_halted());
        assert!(node.state.indexer().fetch_next_height(FROM, TO, 0).unwrap().is_none());

        // Same hash again: the pointer is already final, the links are not.
        failing.store(false, Ordering::SeqCst);
        node.state.finalize(ChainId::Beacon, &b2.hash()).unwrap();
        let link = node.state.indexer().fetch_next_height(FROM, TO, 0).unwrap().unwrap();
        assert_eq!((link.next_height, link.confirm_beacon_height), (7, 2));

        // The next confirmation chains after 7 instead of skipping it.
        let second = cross_shard_block(FROM, TO, 9, 1, 2);
        let b3 = beacon_child(&b2, states_of(std::slice::from_ref(&second)), Vec::new());
        node.state.accept_beacon_block(&b3).unwrap();
        node.state.finalize(ChainId::Beacon, &b3.hash()).unwrap();

        node.deliver(&first);
        node.deliver(&second);
        let batch = node.state.relay_batch(FROM, TO, 0).unwrap();
        assert_eq!(heights(&batch), vec![7, 9]);
    }
}
