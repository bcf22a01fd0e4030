//! Patch scripts produced by the differ.
//!
//! Invariants:
//! - A patch addresses a node by its position under the parent it is applied
//!   to; there are no node keys.
//! - `Update::children[i]` applies to child `i` of the updated node, in order.
//!   `None` entries leave that child untouched.
//! - Quirk patches are applied in order, before any child patch.
//! - Patches borrow the view they were computed from; applying a patch never
//!   needs the previous view.

use crate::view::View;
use std::sync::Arc;

#[derive(Debug)]
pub enum Patch<'a> {
    /// Append a newly materialized subtree as the last child.
    Create(&'a View),
    /// Remove the node at the patched position.
    Remove,
    /// Swap the node at the patched position for a new subtree.
    Replace(&'a View),
    /// Keep the node; patch its quirks and then its children positionally.
    Update {
        children: Vec<Option<Patch<'a>>>,
        quirks: Vec<QuirkPatch>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuirkPatch {
    Set { key: Arc<str>, value: String },
    Remove { key: Arc<str>, last_value: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub creates: usize,
    pub removes: usize,
    pub replaces: usize,
    pub updates: usize,
    pub quirk_sets: usize,
    pub quirk_removes: usize,
}

impl PatchStats {
    /// Number of operations that mutate the live tree.
    pub fn mutations(&self) -> usize {
        self.creates + self.removes + self.replaces + self.quirk_sets + self.quirk_removes
    }
}

impl Patch<'_> {
    /// True when applying the patch touches nothing: an update whose quirk
    /// list is empty and whose child patches are all no-ops.
    pub fn is_noop(&self) -> bool {
        match self {
            Patch::Update { children, quirks } => {
                quirks.is_empty() && children.iter().flatten().all(Patch::is_noop)
            }
            _ => false,
        }
    }

    pub fn stats(&self) -> PatchStats {
        let mut stats = PatchStats::default();
        self.accumulate(&mut stats);
        stats
    }

    fn accumulate(&self, stats: &mut PatchStats) {
        match self {
            Patch::Create(_) => stats.creates += 1,
            Patch::Remove => stats.removes += 1,
            Patch::Replace(_) => stats.replaces += 1,
            Patch::Update { children, quirks } => {
                stats.updates += 1;
                for quirk in quirks {
                    match quirk {
                        QuirkPatch::Set { .. } => stats.quirk_sets += 1,
                        QuirkPatch::Remove { .. } => stats.quirk_removes += 1,
                    }
                }
                for child in children.iter().flatten() {
                    child.accumulate(stats);
                }
            }
        }
    }
}
