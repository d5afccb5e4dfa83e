//! # Relay Service
//!
//! Pulls one batch per call. Shard-block production is serialized per
//! shard, so there is never more than one caller per `(from, to)` cursor.

use std::sync::Arc;

use shared_types::{short_hex, BlockHeight, ChainId, ShardId};
use sl_03_committee_checkpoint::CheckpointApi;
use tracing::{debug, info, warn};

use crate::domain::entities::{CrossShardPayload, RelayBatch, RelayLimits, StopReason};
use crate::domain::errors::{RelayError, RelayResult};
use crate::indexer::CrossShardIndexer;
use crate::ports::inbound::CrossShardRelayApi;
use crate::ports::outbound::{CrossShardBlockSource, SignatureVerifier};

/// Cross-shard relay over its collaborators.
pub struct CrossShardRelay {
    source: Arc<dyn CrossShardBlockSource>,
    verifier: Arc<dyn SignatureVerifier>,
    checkpoints: Arc<dyn CheckpointApi>,
    indexer: Arc<CrossShardIndexer>,
    limits: RelayLimits,
}

impl CrossShardRelay {
    pub fn new(
        source: Arc<dyn CrossShardBlockSource>,
        verifier: Arc<dyn SignatureVerifier>,
        checkpoints: Arc<dyn CheckpointApi>,
        indexer: Arc<CrossShardIndexer>,
        limits: RelayLimits,
    ) -> Self {
        Self {
            source,
            verifier,
            checkpoints,
            indexer,
            limits,
        }
    }

    pub fn limits(&self) -> RelayLimits {
        self.limits
    }
}

impl CrossShardRelayApi for CrossShardRelay {
    fn get_relay_batch(&self, from_shard: ShardId, to_shard: ShardId, start_height: BlockHeight) -> RelayResult<RelayBatch> {
        if from_shard == to_shard {
            return Err(RelayError::SameShard { shard: from_shard });
        }

        let mut candidates = self.source.pending_blocks(from_shard, to_shard, start_height)?;
        candidates.sort_by_key(|b| b.height());

        let mut current = start_height;
        let mut payloads: Vec<CrossShardPayload> = Vec::new();
        let mut batch_epoch = None;
        let mut tx_total = 0usize;
        let mut skipped = 0usize;
        let mut stop_reason = StopReason::Exhausted;

        for block in &candidates {
            if payloads.len() >= self.limits.max_s2b_blocks {
                stop_reason = StopReason::HeightCap;
                break;
            }

            let Some(next) = self.indexer.fetch_next_height(from_shard, to_shard, current)? else {
                // Nothing past `current` confirmed yet.
                break;
            };
            if block.height() != next.next_height || block.hash() != next.next_hash {
                skipped += 1;
                debug!(
                    "[sl-04] {}->{} skip height {} (expecting {})",
                    from_shard,
                    to_shard,
                    block.height(),
                    next.next_height
                );
                continue;
            }

            if *batch_epoch.get_or_insert(block.header.epoch) != block.header.epoch {
                stop_reason = StopReason::EpochChange;
                break;
            }

            let payload = CrossShardPayload::from_block(block, to_shard, &next);
            // A lone oversized block still goes through, or the pair would stall.
            if !payloads.is_empty() && tx_total + payload.transactions.len() > self.limits.max_txs_per_batch {
                stop_reason = StopReason::TxBudget;
                break;
            }

            let committee = match self.checkpoints.committee_at(
                ChainId::Shard(from_shard),
                block.header.epoch,
                block.height(),
            ) {
                Ok(committee) => committee,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!("[sl-04] {}->{} no committee for height {}: {}", from_shard, to_shard, block.height(), e);
                    stop_reason = StopReason::VerifyFailed;
                    break;
                }
            };
            if let Err(e) = self.verifier.verify(block, &committee) {
                warn!(
                    "[sl-04] {}->{} block {} at {} failed verification: {}",
                    from_shard,
                    to_shard,
                    short_hex(&payload.block_hash),
                    block.height(),
                    e
                );
                stop_reason = StopReason::VerifyFailed;
                break;
            }

            tx_total += payload.transactions.len();
            current = block.height();
            payloads.push(payload);

            if block.instructions.iter().any(|inst| inst.is_swap()) {
                stop_reason = StopReason::SwapInstruction;
                break;
            }
        }

        if !payloads.is_empty() {
            info!(
                "[sl-04] {}->{} relayed {} blocks up to {} ({:?})",
                from_shard,
                to_shard,
                payloads.len(),
                current,
                stop_reason
            );
        }
        Ok(RelayBatch {
            payloads,
            next_start_height: current,
            stop_reason,
            skipped,
        })
    }
}
