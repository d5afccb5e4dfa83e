//! # Committee Checkpoints
//!
//! sl-03 lookups against a persisted table, and the integrity path from a
//! mismatched committee up to the runtime supervisor.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_runtime::{LedgerError, EXIT_INTEGRITY_VIOLATION};
    use shared_types::{ChainId, NodeState};
    use sl_01_block_storage::{shared, InMemoryKVStore, SharedKvStore};
    use sl_03_committee_checkpoint::{CheckpointApi, CheckpointError, CheckpointStore, InMemoryCommitteeReader};

    use crate::fixtures::{keys, root, TestNode};

    const SHARD: ChainId = ChainId::Shard(1);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Checkpoints at epochs 2, 5, 9 taking effect at heights 100, 500, 900.
    fn three_epochs() -> (CheckpointStore, SharedKvStore, Arc<InMemoryCommitteeReader>) {
        let kv = shared(InMemoryKVStore::new());
        let reader = Arc::new(InMemoryCommitteeReader::new());
        let store = CheckpointStore::new(kv.clone(), reader.clone(), 2);
        for (epoch, height) in [(2u64, 100u64), (5, 500), (9, 900)] {
            let members = keys(&["a", "b", "c"]);
            reader.set_beacon_committee(SHARD, root(0xB0, epoch), members.clone());
            reader.set_shard_committee(SHARD, root(0x50, epoch), members);
            store.update_from_beacon(SHARD, epoch, root(0xB0, epoch)).unwrap();
            store.update_from_shard(SHARD, epoch, height, root(0x50, epoch)).unwrap();
        }
        (store, kv, reader)
    }

    // =============================================================================
    // LOOKUPS
    // =============================================================================

    #[test]
    fn test_height_lookup_falls_back_to_previous_epoch() {
        let (store, _, _) = three_epochs();
        assert_eq!(store.lookup_by_epoch_and_height(SHARD, 9, 600).unwrap(), (5, root(0xB0, 5)));
        assert_eq!(store.lookup_by_epoch_and_height(SHARD, 9, 950).unwrap(), (9, root(0xB0, 9)));
        assert_eq!(store.lookup_by_epoch_and_height(SHARD, 5, 500).unwrap(), (5, root(0xB0, 5)));
    }

    #[test]
    fn test_height_lookup_before_first_checkpoint_is_not_found() {
        let (store, _, _) = three_epochs();
        assert!(matches!(
            store.lookup_by_epoch_and_height(SHARD, 2, 50),
            Err(CheckpointError::NotFound { .. })
        ));
    }

    #[test]
    fn test_epoch_without_known_start_has_no_committee() {
        let (store, _, reader) = three_epochs();
        reader.set_beacon_committee(SHARD, root(0xB0, 12), keys(&["x", "y", "z"]));
        store.update_from_beacon(SHARD, 12, root(0xB0, 12)).unwrap();

        // Epoch 12 is announced but its start height is not: epoch 9 must not stand in.
        assert!(matches!(
            store.lookup_by_epoch_and_height(SHARD, 12, 1_200),
            Err(CheckpointError::NotFound { epoch: 12, .. })
        ));
        assert!(store.committee_at(SHARD, 12, 1_200).is_err());
        assert_eq!(store.lookup_by_epoch_and_height(SHARD, 10, 950).unwrap(), (9, root(0xB0, 9)));

        reader.set_shard_committee(SHARD, root(0x50, 12), keys(&["x", "y", "z"]));
        store.update_from_shard(SHARD, 12, 1_100, root(0x50, 12)).unwrap();
        assert_eq!(store.committee_at(SHARD, 12, 1_200).unwrap(), keys(&["x", "y", "z"]));
    }

    #[test]
    fn test_height_going_backwards_is_rejected_and_not_persisted() {
        let (store, kv, reader) = three_epochs();
        let err = store.update_from_shard(SHARD, 11, 800, root(0x50, 11)).unwrap_err();
        assert!(matches!(err, CheckpointError::HeightOutOfOrder { epoch: 11, height: 800, .. }));
        assert!(!err.is_fatal());

        let restored = CheckpointStore::restore(kv, reader, 2).unwrap();
        assert_eq!(restored.table(SHARD).epochs(), &[2, 5, 9]);
    }

    #[test]
    fn test_epoch_lookup_between_checkpoints() {
        let (store, _, _) = three_epochs();
        assert_eq!(store.lookup_by_epoch(SHARD, 7), (5, root(0xB0, 5)));
        assert_eq!(store.lookup_by_epoch(SHARD, 100), (9, root(0xB0, 9)));
        assert_eq!(store.committee_for_epoch(SHARD, 6).unwrap(), keys(&["a", "b", "c"]));
    }

    #[test]
    fn test_restore_sees_the_same_table() {
        let (store, kv, reader) = three_epochs();
        let restored = CheckpointStore::restore(kv, reader, 2).unwrap();
        assert_eq!(restored.table(SHARD), store.table(SHARD));
        assert_eq!(restored.lookup_by_epoch_and_height(SHARD, 9, 600).unwrap(), (5, root(0xB0, 5)));
    }

    // =============================================================================
    // INTEGRITY
    // =============================================================================

    #[test]
    fn test_one_key_difference_is_fatal() {
        let kv = shared(InMemoryKVStore::new());
        let reader = Arc::new(InMemoryCommitteeReader::new());
        let store = CheckpointStore::new(kv, reader.clone(), 2);
        reader.set_beacon_committee(SHARD, root(0xB0, 3), keys(&["a", "b", "c", "d"]));
        reader.set_shard_committee(SHARD, root(0x50, 3), keys(&["a", "b", "c", "e"]));

        store.update_from_beacon(SHARD, 3, root(0xB0, 3)).unwrap();
        let err = store.update_from_shard(SHARD, 3, 300, root(0x50, 3)).unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(
            err,
            CheckpointError::IntegrityViolation {
                first_difference: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_integrity_violation_halts_the_node() {
        let node = TestNode::open(2);
        node.seal_committee(SHARD, 1, 0, keys(&["a", "b"])).unwrap();

        let err = node
            .seal_committees(SHARD, 2, 40, keys(&["a", "b"]), keys(&["a", "z"]))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(node.state.supervisor().state(), NodeState::Halted);

        let reason = node.state.supervisor().abort_reason().unwrap();
        assert_eq!(reason.component, "checkpoint");
        assert_eq!(reason.exit_code, EXIT_INTEGRITY_VIOLATION);
        assert_eq!(node.state.metrics().integrity_violations.get(), 1);

        // A halted node accepts nothing else.
        assert!(matches!(
            node.state.update_committee_from_beacon(SHARD, 3, root(0xB0, 3)),
            Err(LedgerError::Halted)
        ));
    }

    #[test]
    fn test_matching_committees_keep_running() {
        let node = TestNode::open(2);
        for epoch in 1..=4u64 {
            node.seal_committee(SHARD, epoch, epoch * 100, keys(&["a", "b", "c"])).unwrap();
        }
        assert_eq!(node.state.supervisor().state(), NodeState::Running);
        assert_eq!(
            node.state.checkpoints().lookup_by_epoch_and_height(SHARD, 4, 350).unwrap().0,
            3
        );
    }
}
