//! # Ledger Configuration
//!
//! Unified configuration for the ledger core.
//!
//! Loaded from an optional JSON file, then overridden from the environment,
//! then validated. Every section has defaults, so `{}` is a valid file.

use std::env;
use std::path::{Path, PathBuf};

use ledger_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use sl_04_cross_shard_relay::RelayLimits;
use thiserror::Error;

/// Complete ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub chain: ChainConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub rewards: RewardConfig,
    pub prefetch: PrefetchConfig,
    pub telemetry: TelemetryConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Chain shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Number of active shards.
    pub active_shards: u8,
    /// Beacon blocks per epoch.
    pub epoch_length: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            active_shards: 8,
            epoch_length: 350,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory for the database.
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    /// fsync after each write.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            backend: StorageBackend::Memory,
            sync_writes: true,
        }
    }
}

/// Cross-shard relay caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub max_s2b_blocks: usize,
    pub max_txs_per_batch: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let limits = RelayLimits::default();
        Self {
            max_s2b_blocks: limits.max_s2b_blocks,
            max_txs_per_batch: limits.max_txs_per_batch,
        }
    }
}

impl From<RelayConfig> for RelayLimits {
    fn from(c: RelayConfig) -> Self {
        RelayLimits {
            max_s2b_blocks: c.max_s2b_blocks,
            max_txs_per_batch: c.max_txs_per_batch,
        }
    }
}

/// Reward split parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Share of each reward that goes to the DAO (and custodians).
    pub dao_percent: u64,
    /// Share of the DAO part that goes to custodians.
    pub custodian_percent: u64,
    /// Whether the custodian part is split out at all.
    pub split_custodian: bool,
    /// Performance score denominator for share prices.
    pub max_score: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            dao_percent: 10,
            custodian_percent: 10,
            split_custodian: true,
            max_score: 1000,
        }
    }
}

impl RewardConfig {
    /// Custodian percent actually applied.
    pub fn effective_custodian_percent(&self) -> u64 {
        if self.split_custodian {
            self.custodian_percent
        } else {
            0
        }
    }
}

/// Propose-cycle prefetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    pub deadline_ms: u64,
    pub queue_capacity: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 1000,
            queue_capacity: 64,
        }
    }
}

impl LedgerConfig {
    /// Read a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `SL_CONFIG` if set, apply environment overrides, validate.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match env::var("SL_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides.
    ///
    /// - `SL_ACTIVE_SHARDS`, `SL_EPOCH_LENGTH`
    /// - `SL_DATA_DIR`, `SL_STORAGE_BACKEND` (`memory` / `rocksdb`)
    /// - telemetry variables, see [`TelemetryConfig::from_env`]
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = env::var("SL_ACTIVE_SHARDS") {
            self.chain.active_shards = parse_env("SL_ACTIVE_SHARDS", &v)?;
        }
        if let Ok(v) = env::var("SL_EPOCH_LENGTH") {
            self.chain.epoch_length = parse_env("SL_EPOCH_LENGTH", &v)?;
        }
        if let Ok(v) = env::var("SL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SL_STORAGE_BACKEND") {
            self.storage.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "rocksdb" => StorageBackend::Rocksdb,
                other => {
                    return Err(ConfigError::Invalid {
                        field: "SL_STORAGE_BACKEND",
                        reason: format!("unknown backend {other:?}"),
                    })
                }
            };
        }
        self.telemetry = self.telemetry.with_env_overrides();
        Ok(self)
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.active_shards == 0 {
            return Err(invalid("chain.active_shards", "must be at least 1"));
        }
        if self.chain.epoch_length == 0 {
            return Err(invalid("chain.epoch_length", "must be at least 1"));
        }
        if self.relay.max_s2b_blocks == 0 {
            return Err(invalid("relay.max_s2b_blocks", "must be at least 1"));
        }
        if self.relay.max_txs_per_batch == 0 {
            return Err(invalid("relay.max_txs_per_batch", "must be at least 1"));
        }
        if self.rewards.dao_percent > 100 {
            return Err(invalid("rewards.dao_percent", "must be at most 100"));
        }
        if self.rewards.custodian_percent > 100 {
            return Err(invalid("rewards.custodian_percent", "must be at most 100"));
        }
        if self.rewards.max_score == 0 {
            return Err(invalid("rewards.max_score", "must be at least 1"));
        }
        if self.prefetch.queue_capacity == 0 {
            return Err(invalid("prefetch.queue_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_env<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        field,
        reason: format!("cannot parse {value:?}"),
    })
}
