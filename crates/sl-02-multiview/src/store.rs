//! MultiView store: every live view of one chain, plus the best and final
//! pointers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared_types::{short_hex, BlockHeight, ChainId, Hash, View};
use sl_01_block_storage::BlockStore;
use tracing::{debug, info};

use crate::domain::errors::{FinalizeError, FinalizeResult, InsertError, InsertResult};
use crate::domain::invariants::{is_ancestor, is_valid_child};
use crate::ports::inbound::MultiViewApi;

/// Shared handle to a tracked view. Stays valid after pruning.
pub type ViewRef = Arc<View>;

/// Writer-side state, guarded by the insertion mutex.
struct MultiViewState {
    views: HashMap<Hash, ViewRef>,
    /// prev hash → children hashes, in insertion order.
    children: HashMap<Hash, Vec<Hash>>,
}

impl MultiViewState {
    fn new(root: ViewRef) -> Self {
        let mut views = HashMap::new();
        views.insert(root.hash(), root);
        Self {
            views,
            children: HashMap::new(),
        }
    }

    /// Keep `root` and its descendants, drop everything else.
    fn retain_descendants_of(&mut self, root: &Hash) -> usize {
        let mut keep: HashMap<Hash, ViewRef> = HashMap::with_capacity(self.views.len());
        let mut queue = VecDeque::from([*root]);
        while let Some(hash) = queue.pop_front() {
            if let Some(view) = self.views.get(&hash) {
                keep.insert(hash, Arc::clone(view));
            }
            if let Some(kids) = self.children.get(&hash) {
                queue.extend(kids.iter().copied());
            }
        }
        let pruned = self.views.len() - keep.len();
        self.children.retain(|parent, _| keep.contains_key(parent));
        self.views = keep;
        pruned
    }
}

/// Fork-tracking store for one chain.
pub struct MultiView {
    chain: ChainId,
    blocks: Arc<dyn BlockStore>,
    state: Mutex<MultiViewState>,
    best: RwLock<ViewRef>,
    finalized: RwLock<ViewRef>,
}

impl MultiView {
    /// Create a store rooted at `root`, which becomes both best and final.
    ///
    /// The root's height is written to the finalized index.
    pub fn new(chain: ChainId, root: View, blocks: Arc<dyn BlockStore>) -> FinalizeResult<Self> {
        blocks.index_finalized(chain, &[(root.height(), root.hash())])?;
        let root = Arc::new(root);
        info!(
            "[sl-02] {} multiview rooted at height {} ({})",
            chain,
            root.height(),
            short_hex(&root.hash())
        );
        Ok(Self {
            chain,
            blocks,
            state: Mutex::new(MultiViewState::new(Arc::clone(&root))),
            best: RwLock::new(Arc::clone(&root)),
            finalized: RwLock::new(root),
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain
    }

    /// Consistent `(final, best)` pair for resolution.
    ///
    /// Final is read first: best only ever moves to descendants of final,
    /// so a later best read is still a descendant.
    pub fn snapshot(&self) -> (ViewRef, ViewRef) {
        let finalized = Arc::clone(&self.finalized.read());
        let best = Arc::clone(&self.best.read());
        (finalized, best)
    }

    /// Number of live views.
    pub fn len(&self) -> usize {
        self.state.lock().views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View at `height` on the best chain, if still live.
    pub fn get_view_by_height(&self, height: BlockHeight) -> Option<ViewRef> {
        let state = self.state.lock();
        let mut cursor = Arc::clone(&self.best.read());
        while cursor.height() > height {
            cursor = Arc::clone(state.views.get(&cursor.prev_hash())?);
        }
        (cursor.height() == height).then_some(cursor)
    }

    /// Finalized segment `(old_final, new_final]` as `(height, hash)` pairs,
    /// ascending.
    fn finalized_segment(
        state: &MultiViewState,
        old_final: &View,
        new_final: &View,
    ) -> Vec<(BlockHeight, Hash)> {
        let mut segment = Vec::new();
        let mut cursor = new_final.hash();
        while cursor != old_final.hash() {
            let Some(view) = state.views.get(&cursor) else {
                break;
            };
            segment.push((view.height(), view.hash()));
            cursor = view.prev_hash();
        }
        segment.sort_by_key(|(height, _)| *height);
        segment
    }
}

impl MultiViewApi for MultiView {
    fn insert(&self, view: View) -> InsertResult<()> {
        if view.chain_id() != self.chain {
            return Err(InsertError::WrongChain {
                expected: self.chain,
                got: view.chain_id(),
            });
        }

        let mut state = self.state.lock();
        let hash = view.hash();
        if state.views.contains_key(&hash) {
            return Err(InsertError::DuplicateView { hash });
        }
        let parent = state
            .views
            .get(&view.prev_hash())
            .ok_or(InsertError::OrphanView {
                hash,
                prev_hash: view.prev_hash(),
            })?;
        if !is_valid_child(parent, &view) {
            return Err(InsertError::HeightMismatch {
                parent_height: parent.height(),
                height: view.height(),
            });
        }

        let view = Arc::new(view);
        state.views.insert(hash, Arc::clone(&view));
        state.children.entry(view.prev_hash()).or_default().push(hash);

        // Strictly higher only: on a tie the earliest-seen tip stays best.
        let promote = view.height() > self.best.read().height();
        if promote {
            *self.best.write() = Arc::clone(&view);
            debug!("[sl-02] {} best view -> height {} ({})", self.chain, view.height(), short_hex(&hash));
        }
        Ok(())
    }

    fn finalize(&self, hash: &Hash) -> FinalizeResult<()> {
        let mut state = self.state.lock();
        let current_final = Arc::clone(&self.finalized.read());
        if current_final.hash() == *hash {
            return Ok(());
        }

        let target = state
            .views
            .get(hash)
            .map(Arc::clone)
            .ok_or(FinalizeError::NotAnAncestor { hash: *hash })?;
        let best = Arc::clone(&self.best.read());
        if target.height() < current_final.height() || !is_ancestor(&state.views, &target, &best) {
            return Err(FinalizeError::NotAnAncestor { hash: *hash });
        }

        // Durable index first, then move the pointer.
        let segment = Self::finalized_segment(&state, &current_final, &target);
        self.blocks.index_finalized(self.chain, &segment)?;
        *self.finalized.write() = Arc::clone(&target);

        let pruned = state.retain_descendants_of(hash);
        info!(
            "[sl-02] {} finalized height {} ({}), pruned {} views",
            self.chain,
            target.height(),
            short_hex(hash),
            pruned
        );
        Ok(())
    }

    fn get_view(&self, hash: &Hash) -> Option<ViewRef> {
        self.state.lock().views.get(hash).map(Arc::clone)
    }

    fn get_all_views_bfs(&self) -> Vec<ViewRef> {
        let state = self.state.lock();
        let root = self.finalized.read().hash();
        let mut out = Vec::with_capacity(state.views.len());
        let mut queue = VecDeque::from([root]);
        while let Some(hash) = queue.pop_front() {
            if let Some(view) = state.views.get(&hash) {
                out.push(Arc::clone(view));
            }
            if let Some(kids) = state.children.get(&hash) {
                queue.extend(kids.iter().copied());
            }
        }
        out
    }

    fn best_view(&self) -> ViewRef {
        Arc::clone(&self.best.read())
    }

    fn final_view(&self) -> ViewRef {
        Arc::clone(&self.finalized.read())
    }
}
