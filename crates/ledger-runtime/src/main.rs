//! # Shard Ledger Runtime
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file from `SL_CONFIG`, then environment)
//! 2. Initialize logging and metrics
//! 3. Open storage
//! 4. Build `ChainState`, restoring committee checkpoints
//! 5. Run until Ctrl+C or a fatal integrity error
//!
//! A fatal error exits with code 70 after a clean shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ledger_runtime::adapters::open_store;
use ledger_runtime::{ChainState, Collaborators, Genesis, LedgerConfig, EXIT_INTEGRITY_VIOLATION};
use ledger_telemetry::init_telemetry;
use sl_03_committee_checkpoint::InMemoryCommitteeReader;
use sl_04_cross_shard_relay::{InMemoryBlockSource, QuorumVerifier};
use tracing::{error, info};

const STATUS_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let config = LedgerConfig::load().context("Failed to load configuration")?;
    let metrics = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Shard Ledger Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("  Shards: {}", config.chain.active_shards);
    info!("===========================================");

    let kv = open_store(&config.storage).context("Failed to open storage")?;
    // Committee state and shard blocks arrive from the network layer, which
    // feeds these adapters.
    let collaborators = Collaborators {
        kv,
        committee_reader: Arc::new(InMemoryCommitteeReader::new()),
        block_source: Arc::new(InMemoryBlockSource::new()),
        verifier: Arc::new(QuorumVerifier),
    };
    let genesis = Genesis::empty(config.chain.active_shards);

    let state = match ChainState::open(config, genesis, collaborators, metrics) {
        Ok(state) => state,
        Err(e) if e.is_fatal() => {
            error!("Refusing to start: {}", e);
            std::process::exit(EXIT_INTEGRITY_VIOLATION);
        }
        Err(e) => return Err(e).context("Failed to open chain state"),
    };

    info!("Ledger is running. Press Ctrl+C to stop.");
    let mut abort = state.supervisor().subscribe();
    let mut status = tokio::time::interval(STATUS_INTERVAL);
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl+C")?;
                info!("Shutdown signal received");
                break;
            }
            _ = abort.changed() => {
                break;
            }
            _ = status.tick() => {
                let (finalized, best) = state.beacon().snapshot();
                info!(
                    "[runtime] beacon final {} best {} ({} live views)",
                    finalized.height(),
                    best.height(),
                    state.beacon().len()
                );
            }
        }
    }

    state.shutdown();
    if let Some(reason) = state.supervisor().abort_reason() {
        error!("Aborting after fatal error in {}: {}", reason.component, reason.message);
        std::process::exit(reason.exit_code);
    }
    Ok(())
}
