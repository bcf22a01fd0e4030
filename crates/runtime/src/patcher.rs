//! Applies patch scripts to the live document.
//!
//! A patch addresses the child at `index` under `parent`. When `index` is out
//! of range the last child is used instead; this is what lets a run of
//! trailing `Remove` patches (emitted at indices `n, n+1, ...` while the live
//! child list shrinks underneath them) remove every surplus child. Side effects
//! never leave the subtree under `parent`.

use dom::{Document, DomError, NodeId, NodeType};
use std::fmt;
use std::sync::Arc;
use vdom::{Patch, QuirkPatch, View};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchError {
    /// `parent` has no child at all to update or replace.
    MissingChild { parent: NodeId, index: usize },
    /// An update addressed a live node that is not an element.
    NotAnElement(NodeId),
    Dom(DomError),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::MissingChild { parent, index } => write!(
                f,
                "node {} has no child to patch at index {index}",
                parent.0
            ),
            PatchError::NotAnElement(node) => {
                write!(f, "update targets node {} which is not an element", node.0)
            }
            PatchError::Dom(err) => write!(f, "document error: {err}"),
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomError> for PatchError {
    fn from(err: DomError) -> Self {
        PatchError::Dom(err)
    }
}

/// Build a detached live subtree for `view`.
pub fn materialize(doc: &mut Document, view: &View) -> Result<NodeId, PatchError> {
    match view {
        View::Text(text) => Ok(doc.create_text(text.as_str())),
        View::Element(element) => {
            let node = doc.create_element(Arc::clone(&element.tag));
            for (key, value) in element.quirks.iter() {
                doc.set_attribute(node, Arc::clone(key), value)?;
            }
            for child in &element.children {
                let child = materialize(doc, child)?;
                doc.append_child(node, child)?;
            }
            Ok(node)
        }
    }
}

pub fn apply(
    doc: &mut Document,
    parent: NodeId,
    patch: Option<&Patch<'_>>,
    index: usize,
) -> Result<(), PatchError> {
    let Some(patch) = patch else {
        return Ok(());
    };
    match patch {
        Patch::Create(view) => {
            let node = materialize(doc, view)?;
            doc.append_child(parent, node)?;
            log::trace!(target: "runtime.patch", "create node {} under {}", node.0, parent.0);
        }
        Patch::Remove => {
            if let Some(child) = target_child(doc, parent, index)? {
                doc.remove_child(parent, child)?;
                log::trace!(target: "runtime.patch", "remove node {} under {}", child.0, parent.0);
            }
        }
        Patch::Replace(view) => {
            let old = target_child(doc, parent, index)?
                .ok_or(PatchError::MissingChild { parent, index })?;
            let node = materialize(doc, view)?;
            doc.replace_child(parent, node, old)?;
            log::trace!(target: "runtime.patch", "replace node {} with {}", old.0, node.0);
        }
        Patch::Update { children, quirks } => {
            let element = target_child(doc, parent, index)?
                .ok_or(PatchError::MissingChild { parent, index })?;
            if doc.node_type(element) != Some(NodeType::Element) {
                return Err(PatchError::NotAnElement(element));
            }
            for quirk in quirks {
                apply_quirk(doc, element, quirk)?;
            }
            for (i, child) in children.iter().enumerate() {
                apply(doc, element, child.as_ref(), i)?;
            }
        }
    }
    Ok(())
}

fn apply_quirk(doc: &mut Document, element: NodeId, quirk: &QuirkPatch) -> Result<(), PatchError> {
    match quirk {
        QuirkPatch::Set { key, value } => {
            doc.set_attribute(element, Arc::clone(key), value.as_str())?;
        }
        QuirkPatch::Remove { key, .. } => {
            doc.remove_attribute(element, key)?;
        }
    }
    Ok(())
}

/// Child at `index`, or the last child when `index` is out of range.
fn target_child(doc: &Document, parent: NodeId, index: usize) -> Result<Option<NodeId>, PatchError> {
    let children = doc.child_nodes(parent)?;
    Ok(children.get(index).or_else(|| children.last()).copied())
}
