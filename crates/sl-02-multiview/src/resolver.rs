//! # Height Resolver
//!
//! Canonical block hash at a height, given `(final, best)`:
//!
//! | Height | Source |
//! |--------|--------|
//! | `> best` | `NotFound` |
//! | `== best` | best hash |
//! | `<= final` | durable height index |
//! | `final < h < best` | walk back from best through block bodies |
//!
//! The walk is bounded by `best - final`, kept small by frequent
//! finalization.

use std::sync::Arc;

use shared_types::{BlockHeight, ChainId, Hash, View};
use sl_01_block_storage::BlockStore;
use tracing::{debug, warn};

use crate::domain::errors::{ResolveError, ResolveResult};
use crate::ports::inbound::HeightResolverApi;

/// Where a resolved hash came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// The best view itself.
    Tip,
    /// The finalized height index.
    FinalizedIndex,
    /// A backward walk loading `steps` block bodies.
    ChainWalk { steps: u64 },
}

/// A resolved height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub hash: Hash,
    pub source: ResolveSource,
}

/// Height resolver for one chain.
pub struct HeightResolver {
    chain: ChainId,
    blocks: Arc<dyn BlockStore>,
}

impl HeightResolver {
    pub fn new(chain: ChainId, blocks: Arc<dyn BlockStore>) -> Self {
        Self { chain, blocks }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain
    }
}

impl HeightResolverApi for HeightResolver {
    fn resolve(&self, final_view: &View, best_view: &View, height: BlockHeight) -> ResolveResult<Resolution> {
        let best_height = best_view.height();
        if height > best_height {
            return Err(ResolveError::NotFound { height, best_height });
        }
        if height == best_height {
            return Ok(Resolution {
                hash: best_view.hash(),
                source: ResolveSource::Tip,
            });
        }

        if height <= final_view.height() {
            // The index write for a just-finalized height may still be in
            // flight; report that instead of guessing.
            return match self.blocks.get_finalized_hash(self.chain, height)? {
                Some(hash) => Ok(Resolution {
                    hash,
                    source: ResolveSource::FinalizedIndex,
                }),
                None => {
                    warn!("[sl-02] {} height {} finalized but not indexed yet", self.chain, height);
                    Err(ResolveError::NotYetIndexed { height })
                }
            };
        }

        let mut cursor_hash = best_view.prev_hash();
        let mut cursor_height = best_height - 1;
        let mut steps = 0u64;
        while height < cursor_height {
            let block = self.blocks.get_block_by_hash(self.chain, &cursor_hash)?;
            cursor_height -= 1;
            cursor_hash = block.prev_hash();
            steps += 1;
        }
        debug!("[sl-02] {} resolved height {} by walking {} blocks", self.chain, height, steps);
        Ok(Resolution {
            hash: cursor_hash,
            source: ResolveSource::ChainWalk { steps },
        })
    }
}
