//! # Shard Ledger Benchmarks
//!
//! | Area | Operation | What grows |
//! |------|-----------|------------|
//! | sl-02 | `resolve` via chain walk | distance from best view |
//! | sl-02 | `resolve` via finalized index | chain length |
//! | sl-04 | `relay_batch` | confirmed heights per batch |

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shared_types::{ChainId, ShardView, View};
use sl_01_block_storage::{shared, BlockStore, InMemoryKVStore, KvBlockStore, StoredBlock};
use sl_02_multiview::{HeightResolver, HeightResolverApi, MultiView, MultiViewApi};
use sl_tests::fixtures::{cross_shard_block, relay_committee, shard_chain, TestNode};

const CHAIN: ChainId = ChainId::Shard(0);

fn bench_height_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("sl-02-height-resolver");

    for len in [64u64, 512] {
        let chain = shard_chain(0, len);
        let blocks = Arc::new(KvBlockStore::new(shared(InMemoryKVStore::new())));
        for block in &chain {
            blocks.store_block(&StoredBlock::Shard(block.clone())).unwrap();
        }
        let root = View::Shard(0, ShardView::from_block(&chain[0]));
        let store = MultiView::new(CHAIN, root, blocks.clone()).unwrap();
        for block in &chain[1..] {
            store.insert(View::Shard(0, ShardView::from_block(block))).unwrap();
        }
        store.finalize(&chain[(len / 2) as usize].hash()).unwrap();

        let resolver = HeightResolver::new(CHAIN, blocks);
        let (finalized, best) = store.snapshot();

        group.bench_with_input(BenchmarkId::new("chain_walk", len), &len, |b, &len| {
            b.iter(|| resolver.resolve(&finalized, &best, black_box(len / 2 + 1)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("finalized_index", len), &len, |b, &len| {
            b.iter(|| resolver.resolve(&finalized, &best, black_box(len / 4)).unwrap())
        });
    }
    group.finish();
}

fn bench_relay_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sl-04-relay");

    for heights in [5u64, 50] {
        let mut config = ledger_runtime::LedgerConfig::default();
        config.chain.active_shards = 2;
        config.relay.max_s2b_blocks = heights as usize;
        let node = TestNode::with_config(config);
        node.seal_committee(CHAIN, 1, 0, relay_committee()).unwrap();

        let blocks: Vec<_> = (1..=heights).map(|h| cross_shard_block(0, 1, h, 1, 4)).collect();
        node.confirm(0, &blocks).unwrap();
        for block in &blocks {
            node.deliver(block);
        }

        group.bench_with_input(BenchmarkId::new("batch", heights), &heights, |b, _| {
            b.iter(|| node.state.relay_batch(0, 1, black_box(0)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_height_resolution, bench_relay_batch);
criterion_main!(benches);
