//! Arena-backed live document tree.
//!
//! Invariants:
//! - `NodeId`s are allocated monotonically and never reused; `NodeId::INVALID`
//!   is never allocated.
//! - A node has at most one parent and operations never create cycles.
//! - Only the document root and elements may have children.
//! - Removing or replacing a child destroys the removed subtree; its ids are
//!   unknown afterwards.
//! - Mutations of nodes connected to the root are recorded in order; building
//!   a detached subtree is not observable until it is attached.

use crate::event::Listener;
use core_types::{ListenerId, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    UnknownNode(NodeId),
    WrongNodeKind(NodeId),
    InvalidParent(NodeId),
    AlreadyAttached(NodeId),
    NotAChild { parent: NodeId, child: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "unknown node {}", id.0),
            DomError::WrongNodeKind(id) => write!(f, "node {} has the wrong kind", id.0),
            DomError::InvalidParent(id) => write!(f, "node {} cannot have children", id.0),
            DomError::AlreadyAttached(id) => write!(f, "node {} already has a parent", id.0),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {} is not a child of node {}", child.0, parent.0)
            }
            DomError::CycleDetected { parent, child } => write!(
                f,
                "appending node {} under node {} would create a cycle",
                child.0, parent.0
            ),
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
}

/// Observable change to the connected tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    ChildList {
        parent: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attribute {
        node: NodeId,
        name: Arc<str>,
        old_value: Option<String>,
    },
}

pub struct Document {
    nodes: HashMap<NodeId, NodeRecord>,
    root: NodeId,
    next_node: u32,
    next_listener: u64,
    mutations: Vec<Mutation>,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            root: NodeId::INVALID,
            next_node: 1,
            next_listener: 1,
            mutations: Vec::new(),
        };
        doc.root = doc.insert_node(NodeKind::Document);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: impl Into<Arc<str>>) -> NodeId {
        self.insert_node(NodeKind::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert_node(NodeKind::Text { text: text.into() })
    }

    fn insert_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            NodeRecord {
                kind,
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            },
        );
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of live nodes, including the document root and detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn record(&self, node: NodeId) -> Result<&NodeRecord, DomError> {
        self.nodes.get(&node).ok_or(DomError::UnknownNode(node))
    }

    fn record_mut(&mut self, node: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.nodes.get_mut(&node).ok_or(DomError::UnknownNode(node))
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.nodes.get(&node).map(|record| match record.kind {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text { .. } => NodeType::Text,
        })
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    pub fn child_nodes(&self, node: NodeId) -> Result<&[NodeId], DomError> {
        Ok(&self.record(node)?.children)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| &**k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> &[(Arc<str>, String)] {
        match self.nodes.get(&node).map(|record| &record.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<Arc<str>>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let name = name.into();
        let value = value.into();
        let connected = self.is_connected(node);
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(node)?.kind else {
            return Err(DomError::WrongNodeKind(node));
        };
        let old_value = match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                attributes.push((Arc::clone(&name), value));
                None
            }
        };
        if connected {
            self.mutations.push(Mutation::Attribute {
                node,
                name,
                old_value,
            });
        }
        Ok(())
    }

    /// Remove an attribute, returning its previous value. Removing an absent
    /// attribute is not a mutation.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let connected = self.is_connected(node);
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(node)?.kind else {
            return Err(DomError::WrongNodeKind(node));
        };
        let Some(pos) = attributes.iter().position(|(k, _)| &**k == name) else {
            return Ok(None);
        };
        let (name, old_value) = attributes.remove(pos);
        if connected {
            self.mutations.push(Mutation::Attribute {
                node,
                name,
                old_value: Some(old_value.clone()),
            });
        }
        Ok(Some(old_value))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        if self.is_connected(parent) {
            self.mutations.push(Mutation::ChildList {
                parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Detach `child` from `parent` and destroy its subtree.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let pos = self.child_position(parent, child)?;
        let connected = self.is_connected(parent);
        self.record_mut(parent)?.children.remove(pos);
        self.destroy_subtree(child);
        if connected {
            self.mutations.push(Mutation::ChildList {
                parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }
        Ok(())
    }

    /// Put detached `new_child` where `old_child` is and destroy `old_child`'s
    /// subtree.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        let pos = self.child_position(parent, old_child)?;
        self.check_insertion(parent, new_child)?;
        let connected = self.is_connected(parent);
        self.record_mut(parent)?.children[pos] = new_child;
        self.record_mut(new_child)?.parent = Some(parent);
        self.destroy_subtree(old_child);
        if connected {
            self.mutations.push(Mutation::ChildList {
                parent,
                added: vec![new_child],
                removed: vec![old_child],
            });
        }
        Ok(())
    }

    /// Destroy every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<(), DomError> {
        let children = std::mem::take(&mut self.record_mut(parent)?.children);
        if children.is_empty() {
            return Ok(());
        }
        for child in &children {
            self.destroy_subtree(*child);
        }
        if self.is_connected(parent) {
            self.mutations.push(Mutation::ChildList {
                parent,
                added: Vec::new(),
                removed: children,
            });
        }
        Ok(())
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if !parent_record.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        if child_record.parent.is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.is_descendant(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.record(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    fn is_descendant(&self, ancestor: NodeId, maybe_descendant: NodeId) -> bool {
        let mut current = self.parent(maybe_descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(record) = self.nodes.remove(&id) {
                stack.extend(record.children);
            }
        }
    }

    /// First connected element whose `id` attribute equals `id`, in tree order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.attribute(node, "id") == Some(id) {
                return Some(node);
            }
            if let Some(record) = self.nodes.get(&node) {
                stack.extend(record.children.iter().rev());
            }
        }
        None
    }

    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: impl Into<Arc<str>>,
        listener: Listener,
    ) -> Result<ListenerId, DomError> {
        let id = ListenerId(self.next_listener);
        let record = self.record_mut(node)?;
        record.listeners.push(Registered {
            id,
            event_type: event_type.into(),
            listener,
        });
        self.next_listener += 1;
        Ok(id)
    }

    pub fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> bool {
        let Some(record) = self.nodes.get_mut(&node) else {
            return false;
        };
        let before = record.listeners.len();
        record.listeners.retain(|registered| registered.id != listener);
        record.listeners.len() != before
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.nodes.get(&node).map_or(0, |record| {
            record
                .listeners
                .iter()
                .filter(|registered| &*registered.event_type == event_type)
                .count()
        })
    }

    /// Listeners for `event_type` registered on `node`, in registration order.
    pub(crate) fn listeners_for(&self, node: NodeId, event_type: &str) -> Vec<Listener> {
        self.nodes.get(&node).map_or_else(Vec::new, |record| {
            record
                .listeners
                .iter()
                .filter(|registered| &*registered.event_type == event_type)
                .map(|registered| registered.listener.clone())
                .collect()
        })
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("pending_mutations", &self.mutations.len())
            .finish()
    }
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Registered>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element { .. })
    }
}

enum NodeKind {
    Document,
    Element {
        tag: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
    },
    Text {
        text: String,
    },
}

struct Registered {
    id: ListenerId,
    event_type: Arc<str>,
    listener: Listener,
}
