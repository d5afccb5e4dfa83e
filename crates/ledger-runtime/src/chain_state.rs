//! # Chain State
//!
//! The one owner of a node's ledger state. Built once at startup, passed by
//! reference to whatever drives it, torn down with [`ChainState::shutdown`].
//!
//! ## Components
//!
//! | Field | Subsystem |
//! |-------|-----------|
//! | `beacon`, `shards` | sl-02 MultiView per chain |
//! | `resolvers` | sl-02 HeightResolver per chain |
//! | `checkpoints` | sl-03 committee checkpoints |
//! | `indexer`, `relay` | sl-04 cross-shard relay |
//! | `committees`, `applied` | sl-05 replay engines and their ledgers |
//!
//! Every fallible operation goes through the [`Supervisor`]; after a fatal
//! error the state refuses further work with [`LedgerError::Halted`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{
    BeaconBlock, BeaconHeader, BeaconView, BlockHeight, ChainId, CommitteeKey, Epoch, Hash, RootSnapshot, ShardBlock,
    ShardHeader, ShardId, ShardView, ValidationData, View, ZERO_HASH,
};
use sl_01_block_storage::{BlockStore, KvBlockStore, SharedKvStore, StoredBlock};
use sl_02_multiview::{HeightResolver, HeightResolverApi, MultiView, MultiViewApi};
use sl_03_committee_checkpoint::{CheckpointApi, CheckpointStore, CommitteeReader};
use sl_04_cross_shard_relay::{
    CrossShardBlockSource, CrossShardIndexer, CrossShardRelay, CrossShardRelayApi, RelayBatch, SignatureVerifier,
};
use sl_05_instruction_replay::{AppliedHeights, CheckpointCommittees, Effects, ReplayEngine};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, LedgerResult};
use crate::supervisor::Supervisor;
use ledger_telemetry::LedgerMetrics;

/// External collaborators the ledger core does not implement itself.
#[derive(Clone)]
pub struct Collaborators {
    pub kv: SharedKvStore,
    pub committee_reader: Arc<dyn CommitteeReader>,
    pub block_source: Arc<dyn CrossShardBlockSource>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

/// Root blocks the view stores start from.
#[derive(Debug, Clone)]
pub struct Genesis {
    pub beacon: BeaconBlock,
    pub shards: Vec<ShardBlock>,
}

impl Genesis {
    /// Empty genesis at height 1 for `active_shards` shards.
    pub fn empty(active_shards: u8) -> Self {
        let beacon = BeaconBlock {
            header: BeaconHeader {
                height: 1,
                prev_hash: ZERO_HASH,
                epoch: 1,
                timestamp: 0,
                proposer: CommitteeKey::new(""),
                roots: RootSnapshot::default(),
            },
            shard_states: BTreeMap::new(),
            instructions: Vec::new(),
            validation_data: ValidationData::default(),
        };
        let beacon_hash = beacon.hash();
        let shards = (0..active_shards)
            .map(|shard_id| ShardBlock {
                header: ShardHeader {
                    shard_id,
                    height: 1,
                    prev_hash: ZERO_HASH,
                    epoch: 1,
                    beacon_height: 1,
                    beacon_hash,
                    timestamp: 0,
                    proposer: CommitteeKey::new(""),
                    cross_shard_bitmap: Vec::new(),
                    roots: RootSnapshot::default(),
                },
                transactions: Vec::new(),
                instructions: Vec::new(),
                validation_data: ValidationData::default(),
            })
            .collect();
        Self { beacon, shards }
    }
}

pub struct ChainState {
    config: LedgerConfig,
    blocks: Arc<KvBlockStore>,
    beacon: MultiView,
    shards: BTreeMap<ShardId, MultiView>,
    resolvers: HashMap<ChainId, HeightResolver>,
    checkpoints: Arc<CheckpointStore>,
    indexer: Arc<CrossShardIndexer>,
    relay: CrossShardRelay,
    committees: Arc<CheckpointCommittees>,
    applied: Mutex<BTreeMap<ShardId, AppliedHeights>>,
    metrics: LedgerMetrics,
    supervisor: Supervisor,
    shutdown_tx: watch::Sender<bool>,
}

impl ChainState {
    /// Build every component and restore persisted checkpoints.
    ///
    /// A corrupt checkpoint table is fatal: the supervisor is told and the
    /// error returned.
    pub fn open(
        config: LedgerConfig,
        genesis: Genesis,
        collaborators: Collaborators,
        metrics: LedgerMetrics,
    ) -> LedgerResult<Self> {
        let active_shards = config.chain.active_shards;
        let supervisor = Supervisor::new(metrics.clone());
        let blocks = Arc::new(KvBlockStore::new(Arc::clone(&collaborators.kv)));
        let block_store: Arc<dyn BlockStore> = blocks.clone();

        blocks.store_block(&StoredBlock::Beacon(genesis.beacon.clone()))?;
        let beacon_root = View::Beacon(BeaconView::from_block(&genesis.beacon, &BTreeMap::new()));
        let beacon = MultiView::new(ChainId::Beacon, beacon_root, Arc::clone(&block_store))?;

        let mut shards = BTreeMap::new();
        for block in genesis.shards.into_iter().filter(|b| b.header.shard_id < active_shards) {
            let shard_id = block.header.shard_id;
            let root = View::Shard(shard_id, ShardView::from_block(&block));
            blocks.store_block(&StoredBlock::Shard(block))?;
            shards.insert(
                shard_id,
                MultiView::new(ChainId::Shard(shard_id), root, Arc::clone(&block_store))?,
            );
        }

        let resolvers = ChainId::all(active_shards)
            .into_iter()
            .map(|chain| (chain, HeightResolver::new(chain, Arc::clone(&block_store))))
            .collect();

        let restored = CheckpointStore::restore(
            Arc::clone(&collaborators.kv),
            Arc::clone(&collaborators.committee_reader),
            active_shards,
        )
        .map_err(LedgerError::from);
        let checkpoints = Arc::new(supervisor.observe("checkpoint", restored)?);

        let indexer = Arc::new(CrossShardIndexer::new(Arc::clone(&collaborators.kv)));
        indexer.start_at(beacon.final_view().height())?;
        let relay = CrossShardRelay::new(
            collaborators.block_source,
            collaborators.verifier,
            checkpoints.clone(),
            Arc::clone(&indexer),
            config.relay.into(),
        );
        let committees = Arc::new(CheckpointCommittees::new(checkpoints.clone()));
        let (shutdown_tx, _) = watch::channel(false);

        supervisor.mark_running();
        info!(
            "[runtime] chain state open: beacon + {} shards, epoch length {}",
            shards.len(),
            config.chain.epoch_length
        );

        Ok(Self {
            config,
            blocks,
            beacon,
            shards,
            resolvers,
            checkpoints,
            indexer,
            relay,
            committees,
            applied: Mutex::new(BTreeMap::new()),
            metrics,
            supervisor,
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    pub fn checkpoints(&self) -> &Arc<CheckpointStore> {
        &self.checkpoints
    }

    pub fn indexer(&self) -> &Arc<CrossShardIndexer> {
        &self.indexer
    }

    pub fn beacon(&self) -> &MultiView {
        &self.beacon
    }

    pub fn shard(&self, shard: ShardId) -> Option<&MultiView> {
        self.shards.get(&shard)
    }

    /// View store of any chain.
    pub fn views(&self, chain: ChainId) -> LedgerResult<&MultiView> {
        match chain {
            ChainId::Beacon => Ok(&self.beacon),
            ChainId::Shard(id) => self.shards.get(&id).ok_or(LedgerError::UnknownChain { chain }),
        }
    }

    fn ensure_running(&self) -> LedgerResult<()> {
        if self.supervisor.is_halted() {
            return Err(LedgerError::Halted);
        }
        Ok(())
    }

    /// Store a beacon block and track its view.
    pub fn accept_beacon_block(&self, block: &BeaconBlock) -> LedgerResult<()> {
        self.ensure_running()?;
        let parent_heights = self
            .beacon
            .get_view(&block.header.prev_hash)
            .and_then(|v| v.as_beacon().map(|b| b.shard_heights.clone()))
            .unwrap_or_default();
        let view = View::Beacon(BeaconView::from_block(block, &parent_heights));

        self.blocks.store_block(&StoredBlock::Beacon(block.clone()))?;
        self.blocks
            .store_root_snapshot(ChainId::Beacon, &block.hash(), &block.header.roots)?;
        self.beacon.insert(view)?;
        self.metrics.record_view_inserted(&ChainId::Beacon.to_string());
        Ok(())
    }

    /// Store a shard block and track its view.
    pub fn accept_shard_block(&self, block: &ShardBlock) -> LedgerResult<()> {
        self.ensure_running()?;
        let chain = ChainId::Shard(block.header.shard_id);
        let store = self.views(chain)?;

        self.blocks.store_block(&StoredBlock::Shard(block.clone()))?;
        self.blocks.store_root_snapshot(chain, &block.hash(), &block.header.roots)?;
        store.insert(View::Shard(block.header.shard_id, ShardView::from_block(block)))?;
        self.metrics.record_view_inserted(&chain.to_string());
        Ok(())
    }

    /// Finalize `hash` on `chain`.
    ///
    /// Finalizing beacon blocks confirms the shard blocks they carry, so the
    /// cross-shard next-height index is written for every final beacon block
    /// past the indexer's progress marker, in height order. A failed link
    /// write is picked up again by the next call, even for the same hash.
    pub fn finalize(&self, chain: ChainId, hash: &Hash) -> LedgerResult<()> {
        self.ensure_running()?;
        let store = self.views(chain)?;
        let old_height = store.final_view().height();
        let live_before = store.len();

        store.finalize(hash)?;

        let new_height = store.final_view().height();
        let pruned = live_before.saturating_sub(store.len());
        self.metrics.record_finalized(&chain.to_string(), new_height, pruned);

        if chain == ChainId::Beacon {
            let through = self.indexer.confirmed_through()?.unwrap_or(old_height);
            for height in through + 1..=new_height {
                let block = self.finalized_beacon_block(height)?;
                let links = self.supervisor.observe(
                    "relay-indexer",
                    self.indexer.record_confirmed(&block).map_err(LedgerError::from),
                )?;
                debug!("[runtime] beacon {} confirmed {} cross-shard links", height, links);
            }
        }
        Ok(())
    }

    fn finalized_beacon_block(&self, height: BlockHeight) -> LedgerResult<BeaconBlock> {
        let hash = self
            .blocks
            .get_finalized_hash(ChainId::Beacon, height)?
            .ok_or(sl_02_multiview::ResolveError::NotYetIndexed { height })?;
        let stored = self.blocks.get_block_by_hash(ChainId::Beacon, &hash)?;
        stored.into_beacon().ok_or(LedgerError::UnknownChain { chain: ChainId::Beacon })
    }

    /// Canonical hash at `height` on `chain`.
    pub fn resolve_height(&self, chain: ChainId, height: BlockHeight) -> LedgerResult<Hash> {
        let store = self.views(chain)?;
        let resolver = self.resolvers.get(&chain).ok_or(LedgerError::UnknownChain { chain })?;
        Ok(resolver.resolve_current(store, height)?)
    }

    /// Record a committee root seen on the beacon chain.
    pub fn update_committee_from_beacon(&self, chain: ChainId, epoch: Epoch, root: Hash) -> LedgerResult<()> {
        self.ensure_running()?;
        let result = self.checkpoints.update_from_beacon(chain, epoch, root).map_err(LedgerError::from);
        self.supervisor.observe("checkpoint", result)?;
        self.metrics.record_checkpoint(&chain.to_string(), "beacon");
        Ok(())
    }

    /// Record a committee root seen on a shard chain at `height`.
    pub fn update_committee_from_shard(
        &self,
        chain: ChainId,
        epoch: Epoch,
        height: BlockHeight,
        root: Hash,
    ) -> LedgerResult<()> {
        self.ensure_running()?;
        let result = self
            .checkpoints
            .update_from_shard(chain, epoch, height, root)
            .map_err(LedgerError::from);
        self.supervisor.observe("checkpoint", result)?;
        self.metrics.record_checkpoint(&chain.to_string(), "shard");
        Ok(())
    }

    /// Next batch of cross-shard payloads for `to_shard`.
    pub fn relay_batch(&self, from_shard: ShardId, to_shard: ShardId, start_height: BlockHeight) -> LedgerResult<RelayBatch> {
        self.ensure_running()?;
        let result = self
            .relay
            .get_relay_batch(from_shard, to_shard, start_height)
            .map_err(LedgerError::from);
        let batch = self.supervisor.observe("relay", result)?;
        self.metrics.record_relay(batch.payloads.len(), batch.skipped);
        Ok(batch)
    }

    /// A fresh replay engine for `shard`.
    pub fn replay_engine(&self, shard: ShardId) -> ReplayEngine {
        ReplayEngine::new(shard, self.committees.clone())
    }

    /// Replay the not-yet-applied blocks of `blocks` for `shard`.
    pub fn replay_for_shard(&self, shard: ShardId, blocks: &[BeaconBlock]) -> LedgerResult<Effects> {
        self.ensure_running()?;
        if !self.shards.contains_key(&shard) {
            return Err(LedgerError::UnknownChain {
                chain: ChainId::Shard(shard),
            });
        }
        let engine = self.replay_engine(shard);
        let result = {
            let mut applied = self.applied.lock();
            applied
                .entry(shard)
                .or_default()
                .replay_unapplied(&engine, blocks)
                .map_err(LedgerError::from)
        };
        let effects = self.supervisor.observe("replay", result)?;
        self.metrics.malformed_instructions.inc_by(effects.malformed as u64);
        Ok(effects)
    }

    /// Receiver that flips to `true` on shutdown.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown to everything holding a [`ChainState::shutdown_signal`].
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let (finalized, best) = self.beacon.snapshot();
        info!(
            "[runtime] shutdown: beacon final {} best {}, {} shards",
            finalized.height(),
            best.height(),
            self.shards.len()
        );
    }
}
