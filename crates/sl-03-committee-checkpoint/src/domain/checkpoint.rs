//! Checkpoint table and its epoch/height lookups.
//!
//! JSON layout is kept compatible with tables written by older nodes:
//! `{"Data": {"<epoch>": {"h": .., "rh": ..}}, "Epochs": [..]}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, Epoch, Hash, ZERO_HASH};

/// Height recorded before the epoch's real height is known.
pub const SENTINEL_HEIGHT: BlockHeight = 10_000_000_000;

/// Root placeholder for a checkpoint created from the shard side.
pub const EMPTY_ROOT: Hash = ZERO_HASH;

/// One epoch's checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeCheckpoint {
    #[serde(rename = "h")]
    pub height: BlockHeight,
    /// Beacon-side committee state root.
    #[serde(rename = "rh", with = "hex_hash")]
    pub root_hash: Hash,
    /// Shard-side committee state root, once the shard has reported it.
    #[serde(rename = "srh", default, skip_serializing_if = "Option::is_none", with = "hex_hash_opt")]
    pub shard_root: Option<Hash>,
}

impl CommitteeCheckpoint {
    pub fn is_height_known(&self) -> bool {
        self.height != SENTINEL_HEIGHT
    }
}

/// All checkpoints of one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointTable {
    #[serde(rename = "Data")]
    data: BTreeMap<Epoch, CommitteeCheckpoint>,
    #[serde(rename = "Epochs")]
    epochs: Vec<Epoch>,
}

impl CheckpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn get(&self, epoch: Epoch) -> Option<&CommitteeCheckpoint> {
        self.data.get(&epoch)
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Insert or replace; keeps `epochs` sorted and unique.
    pub fn upsert(&mut self, epoch: Epoch, checkpoint: CommitteeCheckpoint) {
        if let Err(idx) = self.epochs.binary_search(&epoch) {
            self.epochs.insert(idx, epoch);
        }
        self.data.insert(epoch, checkpoint);
    }

    /// Checkpoint at or before `epoch`. `(0, ZERO_HASH)` when none.
    pub fn at_or_before(&self, epoch: Epoch) -> (Epoch, Hash) {
        let idx = match self.epochs.binary_search(&epoch) {
            Ok(idx) => idx,
            Err(0) => return (0, ZERO_HASH),
            Err(idx) => idx - 1,
        };
        let resolved = self.epochs[idx];
        let root = self.data.get(&resolved).map(|cp| cp.root_hash).unwrap_or(ZERO_HASH);
        (resolved, root)
    }

    /// Checkpoint in effect at `height`, searching around `epoch`.
    ///
    /// Exact epoch: used if its height is `<= height`, else the previous
    /// epoch if that one is old enough. An exact epoch whose start height is
    /// still the sentinel has no answer. No exact epoch: the right neighbour
    /// if old enough, else the left one.
    pub fn in_effect_at(&self, epoch: Epoch, height: BlockHeight) -> Option<(Epoch, Hash)> {
        let pick = |idx: usize| -> Option<(Epoch, Hash)> {
            let e = *self.epochs.get(idx)?;
            let cp = self.data.get(&e)?;
            (cp.height <= height).then_some((e, cp.root_hash))
        };

        match self.epochs.binary_search(&epoch) {
            Ok(idx) => {
                if self.data.get(&epoch).is_some_and(|cp| !cp.is_height_known()) {
                    return None;
                }
                pick(idx).or_else(|| idx.checked_sub(1).and_then(pick))
            }
            Err(idx) => pick(idx).or_else(|| idx.checked_sub(1).and_then(pick)),
        }
    }

    /// `epochs` strictly increasing and naming exactly the keys of `data`.
    pub fn is_well_formed(&self) -> bool {
        self.epochs.windows(2).all(|w| w[0] < w[1])
            && self.epochs.len() == self.data.len()
            && self.epochs.iter().all(|e| self.data.contains_key(e))
    }

    /// Heights are non-decreasing by epoch, ignoring sentinel entries.
    pub fn heights_monotonic(&self) -> bool {
        let known: Vec<BlockHeight> = self
            .epochs
            .iter()
            .filter_map(|e| self.data.get(e))
            .filter(|cp| cp.is_height_known())
            .map(|cp| cp.height)
            .collect();
        known.windows(2).all(|w| w[0] <= w[1])
    }
}

mod hex_hash {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::Hash;

    pub fn serialize<S: Serializer>(hash: &Hash, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| D::Error::custom(format!("expected 32 bytes, got {}", bytes.len())))
    }
}

mod hex_hash_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::Hash;

    pub fn serialize<S: Serializer>(hash: &Option<Hash>, s: S) -> Result<S::Ok, S::Error> {
        match hash {
            Some(h) => super::hex_hash::serialize(h, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Hash>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::hex_hash")] Hash);
        Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(h)| h))
    }
}
