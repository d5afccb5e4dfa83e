//! Prometheus metrics for the ledger core.
//!
//! All metrics follow the naming convention: `sl_<component>_<metric>_<unit>`
//!
//! The registry is owned by [`LedgerMetrics`]; there is no process-wide
//! registry, so tests can build as many instances as they like.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

/// Counters and gauges for views, checkpoints, relay and replay.
#[derive(Clone)]
pub struct LedgerMetrics {
    registry: Registry,

    /// Views inserted, by chain
    pub views_inserted: IntCounterVec,

    /// Views dropped by finalization, by chain
    pub views_pruned: IntCounterVec,

    /// Height of the final view, by chain
    pub finalized_height: IntGaugeVec,

    /// Checkpoint updates, by chain and source (`beacon` / `shard`)
    pub checkpoint_updates: IntCounterVec,

    /// Beacon and shard committee roots that disagreed
    pub integrity_violations: IntCounter,

    /// Relay candidates, by outcome (`accepted` / `skipped`)
    pub relay_blocks: IntCounterVec,

    /// Beacon instructions skipped during replay
    pub malformed_instructions: IntCounter,
}

impl LedgerMetrics {
    /// Create and register every metric.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let views_inserted = IntCounterVec::new(
            Opts::new("sl_multiview_views_inserted_total", "Views accepted into the view graph"),
            &["chain"],
        )
        .map_err(init_error)?;
        let views_pruned = IntCounterVec::new(
            Opts::new("sl_multiview_views_pruned_total", "Views removed by finalization"),
            &["chain"],
        )
        .map_err(init_error)?;
        let finalized_height = IntGaugeVec::new(
            Opts::new("sl_multiview_finalized_height", "Height of the final view"),
            &["chain"],
        )
        .map_err(init_error)?;
        let checkpoint_updates = IntCounterVec::new(
            Opts::new("sl_checkpoint_updates_total", "Committee checkpoint updates"),
            &["chain", "source"],
        )
        .map_err(init_error)?;
        let integrity_violations = IntCounter::new(
            "sl_checkpoint_integrity_violations_total",
            "Beacon and shard committee roots that disagreed",
        )
        .map_err(init_error)?;
        let relay_blocks = IntCounterVec::new(
            Opts::new("sl_relay_blocks_total", "Cross-shard relay candidates by outcome"),
            &["outcome"],
        )
        .map_err(init_error)?;
        let malformed_instructions = IntCounter::new(
            "sl_replay_malformed_instructions_total",
            "Beacon instructions skipped as malformed",
        )
        .map_err(init_error)?;

        registry.register(Box::new(views_inserted.clone())).map_err(init_error)?;
        registry.register(Box::new(views_pruned.clone())).map_err(init_error)?;
        registry.register(Box::new(finalized_height.clone())).map_err(init_error)?;
        registry.register(Box::new(checkpoint_updates.clone())).map_err(init_error)?;
        registry.register(Box::new(integrity_violations.clone())).map_err(init_error)?;
        registry.register(Box::new(relay_blocks.clone())).map_err(init_error)?;
        registry.register(Box::new(malformed_instructions.clone())).map_err(init_error)?;

        Ok(Self {
            registry,
            views_inserted,
            views_pruned,
            finalized_height,
            checkpoint_updates,
            integrity_violations,
            relay_blocks,
            malformed_instructions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_view_inserted(&self, chain: &str) {
        self.views_inserted.with_label_values(&[chain]).inc();
    }

    pub fn record_finalized(&self, chain: &str, height: u64, pruned: usize) {
        self.finalized_height
            .with_label_values(&[chain])
            .set(i64::try_from(height).unwrap_or(i64::MAX));
        self.views_pruned.with_label_values(&[chain]).inc_by(pruned as u64);
    }

    pub fn record_checkpoint(&self, chain: &str, source: &str) {
        self.checkpoint_updates.with_label_values(&[chain, source]).inc();
    }

    pub fn record_relay(&self, accepted: usize, skipped: usize) {
        self.relay_blocks.with_label_values(&["accepted"]).inc_by(accepted as u64);
        self.relay_blocks.with_label_values(&["skipped"]).inc_by(skipped as u64);
    }

    /// Text exposition format for a scrape endpoint.
    pub fn gather(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(init_error)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

fn init_error(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}
