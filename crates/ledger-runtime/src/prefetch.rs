//! # Propose-Cycle Prefetch
//!
//! Before a shard proposes, two workers pull ahead what the proposal will
//! need: beacon blocks above the shard's last seen beacon height, and
//! pending transactions. Both write into bounded queues and stop at
//! whichever comes first: cancellation, the deadline, or the source
//! running dry.
//!
//! ```text
//!           ┌─ beacon worker ─→ mpsc(cap) ─→ proposer
//! start() ──┤
//!           └─ tx worker ─────→ mpsc(cap) ─→ proposer
//!              ↑ watch(cancel) + deadline shared by both
//! ```
//!
//! A cycle must `join()` its handle before starting the next one, so no
//! worker from an old cycle writes into a new cycle's queues.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{BeaconBlock, BlockHeight, ShardId, TxRecord};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::config::PrefetchConfig;

/// Beacon blocks for the proposer.
#[async_trait]
pub trait BeaconBlockFeed: Send + Sync {
    /// Next blocks above `height`, ascending. Empty when caught up.
    async fn beacon_blocks_after(&self, height: BlockHeight, limit: usize) -> Vec<BeaconBlock>;
}

/// Pending transactions for the proposer.
#[async_trait]
pub trait PendingTxFeed: Send + Sync {
    /// Up to `limit` pending transactions not returned before. Empty when drained.
    async fn pending_transactions(&self, shard: ShardId, limit: usize) -> Vec<TxRecord>;
}

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("Prefetch worker {worker} panicked or was aborted: {message}")]
    Worker { worker: &'static str, message: String },
}

/// Items each worker delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    pub beacon_blocks: usize,
    pub transactions: usize,
}

/// Receiving ends for the proposer.
pub struct PrefetchQueues {
    pub beacon_blocks: mpsc::Receiver<BeaconBlock>,
    pub transactions: mpsc::Receiver<TxRecord>,
}

/// Handle on one cycle's workers.
pub struct PrefetchHandle {
    cancel_tx: watch::Sender<bool>,
    beacon_task: Option<JoinHandle<usize>>,
    tx_task: Option<JoinHandle<usize>>,
    deadline: Instant,
}

impl PrefetchHandle {
    /// Spawn both workers for `shard`, starting above `beacon_height`.
    pub fn start(
        config: &PrefetchConfig,
        shard: ShardId,
        beacon_height: BlockHeight,
        beacon_feed: Arc<dyn BeaconBlockFeed>,
        tx_feed: Arc<dyn PendingTxFeed>,
    ) -> (Self, PrefetchQueues) {
        let capacity = config.queue_capacity.max(1);
        let deadline = Instant::now() + Duration::from_millis(config.deadline_ms);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (beacon_tx, beacon_rx) = mpsc::channel(capacity);
        let (txs_tx, txs_rx) = mpsc::channel(capacity);

        let beacon_task = tokio::spawn(beacon_worker(
            beacon_feed,
            beacon_height,
            capacity,
            beacon_tx,
            cancel_rx.clone(),
            deadline,
        ));
        let tx_task = tokio::spawn(tx_worker(tx_feed, shard, capacity, txs_tx, cancel_rx, deadline));

        debug!("[runtime] prefetch started for shard {} above beacon {}", shard, beacon_height);
        (
            Self {
                cancel_tx,
                beacon_task: Some(beacon_task),
                tx_task: Some(tx_task),
                deadline,
            },
            PrefetchQueues {
                beacon_blocks: beacon_rx,
                transactions: txs_rx,
            },
        )
    }

    /// Ask both workers to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for both workers to finish.
    ///
    /// Does not cancel; call [`PrefetchHandle::cancel`] first to stop early.
    pub async fn join(mut self) -> Result<PrefetchStats, PrefetchError> {
        let beacon_blocks = join_worker("beacon", self.beacon_task.take()).await?;
        let transactions = join_worker("transactions", self.tx_task.take()).await?;
        Ok(PrefetchStats {
            beacon_blocks,
            transactions,
        })
    }
}

impl Drop for PrefetchHandle {
    fn drop(&mut self) {
        // An unjoined handle must not leave workers running.
        if self.beacon_task.is_some() || self.tx_task.is_some() {
            self.cancel();
        }
    }
}

async fn join_worker(worker: &'static str, task: Option<JoinHandle<usize>>) -> Result<usize, PrefetchError> {
    match task {
        Some(handle) => handle.await.map_err(|e| PrefetchError::Worker {
            worker,
            message: e.to_string(),
        }),
        None => Ok(0),
    }
}

/// Stop signal: cancellation flag set, or deadline passed.
async fn stopped(cancel: &mut watch::Receiver<bool>, deadline: Instant) {
    tokio::select! {
        _ = cancelled(cancel) => {}
        _ = tokio::time::sleep_until(deadline) => {}
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            // Handle gone without cancelling; only the deadline remains.
            std::future::pending::<()>().await;
        }
    }
}

async fn beacon_worker(
    feed: Arc<dyn BeaconBlockFeed>,
    mut height: BlockHeight,
    batch: usize,
    out: mpsc::Sender<BeaconBlock>,
    mut cancel: watch::Receiver<bool>,
    deadline: Instant,
) -> usize {
    let mut sent = 0;
    loop {
        let blocks = tokio::select! {
            blocks = feed.beacon_blocks_after(height, batch) => blocks,
            _ = stopped(&mut cancel, deadline) => break,
        };
        if blocks.is_empty() {
            break;
        }
        for block in blocks {
            let next = block.height();
            tokio::select! {
                res = out.send(block) => {
                    if res.is_err() {
                        return sent;
                    }
                }
                _ = stopped(&mut cancel, deadline) => return sent,
            }
            height = height.max(next);
            sent += 1;
        }
    }
    sent
}

async fn tx_worker(
    feed: Arc<dyn PendingTxFeed>,
    shard: ShardId,
    batch: usize,
    out: mpsc::Sender<TxRecord>,
    mut cancel: watch::Receiver<bool>,
    deadline: Instant,
) -> usize {
    let mut sent = 0;
    loop {
        let txs = tokio::select! {
            txs = feed.pending_transactions(shard, batch) => txs,
            _ = stopped(&mut cancel, deadline) => break,
        };
        if txs.is_empty() {
            break;
        }
        for tx in txs {
            tokio::select! {
                res = out.send(tx) => {
                    if res.is_err() {
                        return sent;
                    }
                }
                _ = stopped(&mut cancel, deadline) => return sent,
            }
            sent += 1;
        }
    }
    sent
}
