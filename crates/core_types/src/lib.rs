pub type RawNodeId = u32;

/// Handle of a node in a live document.
///
/// Handles are allocated by the document arena and never reused, so a stale
/// handle always resolves to "unknown node" instead of aliasing a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub RawNodeId);

impl NodeId {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeId = NodeId(0);
}

/// Handle of a native listener registered on a document node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Monotonic counter of completed render passes for one mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderVersion(pub u64);

impl RenderVersion {
    pub const INITIAL: RenderVersion = RenderVersion(0);

    pub fn next(self) -> Self {
        RenderVersion(self.0.wrapping_add(1))
    }
}
