//! Positional view-tree diffing to patch scripts.
//!
//! Contract:
//! - Absent old + present new emits `Create`; present old + absent new emits
//!   `Remove`; both absent emits nothing.
//! - Nodes of a different kind, texts with different content and elements with
//!   different tags are "changed" and emit `Replace`.
//! - Equal texts emit nothing. Elements that are not changed always emit an
//!   `Update`, even when it turns out to be empty.
//! - Children are matched by index only. The child patch list has length
//!   `max(old, new)`, so an insertion or removal in the middle of a child list
//!   misaligns every following sibling and re-diffs it against its neighbour
//!   (usually a `Replace`). There is no keyed reconciliation.
//! - Quirk patches walk the union of keys: old keys in old order, then keys
//!   only present in new, in new order.
//!
//! Complexity: O(n) in the number of nodes of the larger tree, plus O(k²) per
//! element in the number of quirks (quirk maps are small ordered vectors).

use crate::patch::{Patch, QuirkPatch};
use crate::view::{Element, Quirks, View};

pub fn diff<'a>(old: Option<&View>, new: Option<&'a View>) -> Option<Patch<'a>> {
    match (old, new) {
        (None, None) => None,
        (None, Some(new)) => Some(Patch::Create(new)),
        (Some(_), None) => Some(Patch::Remove),
        (Some(old), Some(new)) => diff_present(old, new),
    }
}

/// Diff two present trees.
pub fn diff_root<'a>(old: &View, new: &'a View) -> Option<Patch<'a>> {
    diff_present(old, new)
}

fn diff_present<'a>(old: &View, new: &'a View) -> Option<Patch<'a>> {
    if changed(old, new) {
        return Some(Patch::Replace(new));
    }
    match (old, new) {
        (View::Element(old), View::Element(new)) => Some(Patch::Update {
            children: diff_children(old, new),
            quirks: diff_quirks(&old.quirks, &new.quirks),
        }),
        _ => None,
    }
}

pub fn changed(old: &View, new: &View) -> bool {
    match (old, new) {
        (View::Text(old), View::Text(new)) => old != new,
        (View::Element(old), View::Element(new)) => old.tag != new.tag,
        _ => true,
    }
}

fn diff_children<'a>(old: &Element, new: &'a Element) -> Vec<Option<Patch<'a>>> {
    let len = old.children.len().max(new.children.len());
    (0..len)
        .map(|i| diff(old.children.get(i), new.children.get(i)))
        .collect()
}

pub fn diff_quirks(old: &Quirks, new: &Quirks) -> Vec<QuirkPatch> {
    let mut patches = Vec::new();
    let keys = old.keys().chain(new.keys().filter(|k| !old.contains_key(k)));
    for key in keys {
        match (old.get(key), new.get(key)) {
            (Some(last_value), None) => patches.push(QuirkPatch::Remove {
                key: key.clone(),
                last_value: last_value.to_string(),
            }),
            (None, Some(value)) => patches.push(QuirkPatch::Set {
                key: key.clone(),
                value: value.to_string(),
            }),
            (Some(old_value), Some(value)) if old_value != value => {
                patches.push(QuirkPatch::Set {
                    key: key.clone(),
                    value: value.to_string(),
                })
            }
            _ => {}
        }
    }
    patches
}
