//! # Inbound Ports (Driving Ports)
//!
//! APIs exposed to block production, validation and query handlers.

use shared_types::{BlockHeight, Hash, View};

use crate::domain::errors::{FinalizeResult, InsertResult, ResolveResult};
use crate::resolver::Resolution;
use crate::store::{MultiView, ViewRef};

/// Fork-tracking API for one chain.
pub trait MultiViewApi: Send + Sync {
    /// Track a new view.
    ///
    /// ## Errors
    ///
    /// - `OrphanView`: parent is not a live view
    /// - `HeightMismatch`: height is not parent height + 1
    /// - `DuplicateView`: already tracked
    fn insert(&self, view: View) -> InsertResult<()>;

    /// Promote the view at `hash` to final and prune unreachable views.
    ///
    /// ## Errors
    ///
    /// - `NotAnAncestor`: `hash` is not on the best chain above the current final
    fn finalize(&self, hash: &Hash) -> FinalizeResult<()>;

    /// A live view by hash. Pruned views return `None`.
    fn get_view(&self, hash: &Hash) -> Option<ViewRef>;

    /// Every live view, breadth-first from the final view.
    fn get_all_views_bfs(&self) -> Vec<ViewRef>;

    fn best_view(&self) -> ViewRef;

    fn final_view(&self) -> ViewRef;
}

/// Canonical hash lookup by height.
pub trait HeightResolverApi: Send + Sync {
    /// Resolve `height` against an explicit `(final, best)` pair.
    fn resolve(&self, final_view: &View, best_view: &View, height: BlockHeight) -> ResolveResult<Resolution>;

    /// Resolve and return only the hash.
    fn resolve_hash(&self, final_view: &View, best_view: &View, height: BlockHeight) -> ResolveResult<Hash> {
        self.resolve(final_view, best_view, height).map(|r| r.hash)
    }

    /// Resolve against the current pointers of `store`.
    fn resolve_current(&self, store: &MultiView, height: BlockHeight) -> ResolveResult<Hash> {
        let (finalized, best) = store.snapshot();
        self.resolve_hash(&finalized, &best, height)
    }
}
