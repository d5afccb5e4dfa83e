//! # Invariant Checks
//!
//! Pure functions over a view map, shared by the store and its tests.

use std::collections::HashMap;

use shared_types::{Hash, View};

use crate::store::ViewRef;

/// Invariant: `ancestor` is reachable from `tip` by following `prev_hash`
/// zero or more times through `views`.
pub fn is_ancestor(views: &HashMap<Hash, ViewRef>, ancestor: &View, tip: &View) -> bool {
    let mut cursor = tip.hash();
    let mut height = tip.height();
    loop {
        if cursor == ancestor.hash() {
            return true;
        }
        if height <= ancestor.height() {
            return false;
        }
        match views.get(&cursor) {
            Some(view) => {
                cursor = view.prev_hash();
                height = view.height().saturating_sub(1);
            }
            None => return false,
        }
    }
}

/// Invariant: a child sits exactly one height above its parent.
pub fn is_valid_child(parent: &View, child: &View) -> bool {
    parent.height().checked_add(1) == Some(child.height())
}
