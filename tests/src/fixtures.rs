//! # Test Fixtures
//!
//! Block builders shared by the integration tests and the benchmarks, plus
//! [`TestNode`]: a [`ChainState`] wired to in-memory collaborators the test
//! can feed directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use ledger_runtime::{ChainState, Collaborators, Genesis, LedgerConfig, LedgerResult};
use ledger_telemetry::LedgerMetrics;
use parking_lot::Mutex;
use shared_types::{
    BeaconBlock, BlockHeight, ChainId, CommitteeKey, Epoch, Hash, Instruction, RootSnapshot, ShardBlock, ShardHeader,
    ShardId, ShardState, TxRecord, ValidationData, ZERO_HASH,
};
use sl_01_block_storage::{shared, InMemoryKVStore, SharedKvStore};
use sl_03_committee_checkpoint::InMemoryCommitteeReader;
use sl_04_cross_shard_relay::{InMemoryBlockSource, QuorumVerifier};

// =============================================================================
// BLOCK BUILDERS
// =============================================================================

pub fn keys(names: &[&str]) -> Vec<CommitteeKey> {
    names.iter().map(|n| CommitteeKey::new(*n)).collect()
}

/// The committee every relayed shard block in these tests is signed by.
pub fn relay_committee() -> Vec<CommitteeKey> {
    keys(&["p0", "p1", "p2", "p3"])
}

/// Unsigned shard block with no transactions.
pub fn shard_block(shard_id: ShardId, height: BlockHeight, prev_hash: Hash) -> ShardBlock {
    ShardBlock {
        header: ShardHeader {
            shard_id,
            height,
            prev_hash,
            epoch: 1,
            beacon_height: 0,
            beacon_hash: ZERO_HASH,
            timestamp: height,
            proposer: CommitteeKey::new("p0"),
            cross_shard_bitmap: Vec::new(),
            roots: RootSnapshot::default(),
        },
        transactions: Vec::new(),
        instructions: Vec::new(),
        validation_data: ValidationData::default(),
    }
}

/// Linked chain at heights `0..=top`.
pub fn shard_chain(shard_id: ShardId, top: BlockHeight) -> Vec<ShardBlock> {
    let mut blocks: Vec<ShardBlock> = Vec::new();
    for height in 0..=top {
        let prev = blocks.last().map(ShardBlock::hash).unwrap_or(ZERO_HASH);
        blocks.push(shard_block(shard_id, height, prev));
    }
    blocks
}

/// Child of `parent`. Different `fork` values give sibling blocks.
pub fn shard_child(parent: &ShardBlock, fork: u64) -> ShardBlock {
    let mut block = parent.clone();
    block.header.height += 1;
    block.header.prev_hash = parent.hash();
    block.header.timestamp = parent.header.timestamp + 1 + fork;
    block
}

/// Quorum-signed shard block carrying `txs` transfers to `to_shard`.
pub fn cross_shard_block(from: ShardId, to: ShardId, height: BlockHeight, epoch: Epoch, txs: usize) -> ShardBlock {
    let mut block = shard_block(from, height, [height as u8; 32]);
    block.header.epoch = epoch;
    block.header.cross_shard_bitmap = vec![to];
    block.transactions = (0..txs)
        .map(|i| TxRecord {
            hash: [i as u8 ^ height as u8; 32],
            metadata_type: 0,
            to_shard: Some(to),
        })
        .collect();
    block.validation_data.signer_indices = vec![0, 1, 2];
    block
}

/// Beacon child of `parent`.
pub fn beacon_child(
    parent: &BeaconBlock,
    shard_states: BTreeMap<ShardId, Vec<ShardState>>,
    instructions: Vec<Instruction>,
) -> BeaconBlock {
    let mut header = parent.header.clone();
    header.height += 1;
    header.prev_hash = parent.hash();
    header.timestamp += 1;
    BeaconBlock {
        header,
        shard_states,
        instructions,
        validation_data: ValidationData::default(),
    }
}

/// Committee root for `(tag, epoch)`. Distinct tags never collide.
pub fn root(tag: u8, epoch: Epoch) -> Hash {
    let mut hash = [tag; 32];
    hash[24..].copy_from_slice(&epoch.to_be_bytes());
    hash
}

const BEACON_ROOT_TAG: u8 = 0xB0;
const SHARD_ROOT_TAG: u8 = 0x50;

// =============================================================================
// CHAIN STATE HARNESS
// =============================================================================

/// A node's chain state plus handles on its in-memory collaborators.
pub struct TestNode {
    pub state: ChainState,
    pub genesis: Genesis,
    pub reader: Arc<InMemoryCommitteeReader>,
    pub source: Arc<InMemoryBlockSource>,
    beacon_tip: Mutex<BeaconBlock>,
}

impl TestNode {
    pub fn open(active_shards: u8) -> Self {
        let mut config = LedgerConfig::default();
        config.chain.active_shards = active_shards;
        Self::with_config(config)
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self::with_store(config, shared(InMemoryKVStore::new()))
    }

    /// Node over a caller-supplied key-value store.
    pub fn with_store(config: LedgerConfig, kv: SharedKvStore) -> Self {
        let genesis = Genesis::empty(config.chain.active_shards);
        let reader = Arc::new(InMemoryCommitteeReader::new());
        let source = Arc::new(InMemoryBlockSource::new());
        let collaborators = Collaborators {
            kv,
            committee_reader: reader.clone(),
            block_source: source.clone(),
            verifier: Arc::new(QuorumVerifier),
        };
        let metrics = LedgerMetrics::new().expect("metrics registry");
        let state = ChainState::open(config, genesis.clone(), collaborators, metrics).expect("open chain state");
        Self {
            state,
            beacon_tip: Mutex::new(genesis.beacon.clone()),
            genesis,
            reader,
            source,
        }
    }

    /// Seed the same committee under both roots and record both sides.
    pub fn seal_committee(
        &self,
        chain: ChainId,
        epoch: Epoch,
        height: BlockHeight,
        members: Vec<CommitteeKey>,
    ) -> LedgerResult<()> {
        self.seal_committees(chain, epoch, height, members.clone(), members)
    }

    /// Seed possibly different beacon and shard committees, beacon side first.
    pub fn seal_committees(
        &self,
        chain: ChainId,
        epoch: Epoch,
        height: BlockHeight,
        beacon: Vec<CommitteeKey>,
        shard: Vec<CommitteeKey>,
    ) -> LedgerResult<()> {
        let beacon_root = root(BEACON_ROOT_TAG, epoch);
        let shard_root = root(SHARD_ROOT_TAG, epoch);
        self.reader.set_beacon_committee(chain, beacon_root, beacon);
        self.reader.set_shard_committee(chain, shard_root, shard);
        self.state.update_committee_from_beacon(chain, epoch, beacon_root)?;
        self.state.update_committee_from_shard(chain, epoch, height, shard_root)
    }

    /// Extend the beacon chain by one block and finalize it.
    pub fn finalize_beacon(
        &self,
        shard_states: BTreeMap<ShardId, Vec<ShardState>>,
        instructions: Vec<Instruction>,
    ) -> LedgerResult<BeaconBlock> {
        let mut tip = self.beacon_tip.lock();
        let block = beacon_child(&tip, shard_states, instructions);
        self.state.accept_beacon_block(&block)?;
        self.state.finalize(ChainId::Beacon, &block.hash())?;
        *tip = block.clone();
        Ok(block)
    }

    /// Confirm `blocks` of shard `from` in one final beacon block.
    pub fn confirm(&self, from: ShardId, blocks: &[ShardBlock]) -> LedgerResult<BeaconBlock> {
        let states = blocks
            .iter()
            .map(|b| ShardState {
                height: b.height(),
                hash: b.hash(),
                cross_shard: b.header.cross_shard_bitmap.clone(),
                tx_count: b.transactions.len() as u64,
            })
            .collect();
        self.finalize_beacon(BTreeMap::from([(from, states)]), Vec::new())
    }

    /// Hand a block to the relay's source, as the network would.
    pub fn deliver(&self, block: &ShardBlock) {
        self.source.push(block.clone());
    }

    pub fn beacon_tip(&self) -> BeaconBlock {
        self.beacon_tip.lock().clone()
    }
}
