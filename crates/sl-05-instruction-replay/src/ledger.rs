//! Applied-height ledger.
//!
//! Replay itself is pure; crediting the same beacon range twice is
//! prevented here by remembering which heights a shard already folded in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared_types::{BeaconBlock, BlockHeight};
use tracing::debug;

use crate::domain::effects::Effects;
use crate::domain::errors::ReplayResult;
use crate::ports::inbound::ReplayApi;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedHeights {
    applied: BTreeSet<BlockHeight>,
}

impl AppliedHeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, height: BlockHeight) -> bool {
        self.applied.contains(&height)
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Replay the blocks not applied yet and mark them applied.
    ///
    /// Nothing is marked when replay fails.
    pub fn replay_unapplied(&mut self, engine: &dyn ReplayApi, blocks: &[BeaconBlock]) -> ReplayResult<Effects> {
        let fresh: Vec<BeaconBlock> = blocks
            .iter()
            .filter(|b| !self.applied.contains(&b.height()))
            .cloned()
            .collect();
        if fresh.len() < blocks.len() {
            debug!("[sl-05] skipping {} already applied blocks", blocks.len() - fresh.len());
        }

        let effects = engine.replay(&fresh)?;
        self.applied.extend(fresh.iter().map(BeaconBlock::height));
        Ok(effects)
    }

    /// Forget heights below `height`; they can no longer be replayed.
    pub fn prune_below(&mut self, height: BlockHeight) {
        self.applied = self.applied.split_off(&height);
    }
}
