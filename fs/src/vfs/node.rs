//! # VFS Nodes
//!
//! Node records and the counted-reference handle.

use crate::DeviceId;
use alloc::collections::BTreeMap;
use alloc::string::String;

/// Identifier of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// What a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Directory
    Directory,
    /// Regular file
    Regular,
    /// Character-special device node
    CharDevice(DeviceId),
    /// Block-special device node
    BlockDevice(DeviceId),
}

impl NodeKind {
    /// The device identifier, for device nodes
    pub fn device(&self) -> Option<DeviceId> {
        match self {
            NodeKind::CharDevice(dev) | NodeKind::BlockDevice(dev) => Some(*dev),
            _ => None,
        }
    }
}

/// A node record
pub struct Vnode {
    kind: NodeKind,
    refcount: u32,
    children: BTreeMap<String, NodeId>,
}

impl Vnode {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            refcount: 0,
            children: BTreeMap::new(),
        }
    }

    /// What this node is
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Outstanding references to this node
    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    pub(crate) fn incref(&mut self) {
        self.refcount += 1;
    }

    pub(crate) fn decref(&mut self) {
        assert!(self.refcount > 0, "reference released below zero");
        self.refcount -= 1;
    }

    pub(crate) fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<String, NodeId> {
        &mut self.children
    }

    /// Number of directory entries (directories only)
    pub fn entry_count(&self) -> usize {
        self.children.len()
    }
}

/// An owned, counted reference to a node
///
/// Move-only: the count was incremented when the handle was produced and
/// is decremented exactly once, when the handle is passed back to
/// [`crate::Vfs::close`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a node handle leaks its reference; pass it back to Vfs::close"]
pub struct NodeHandle {
    node: NodeId,
}

impl NodeHandle {
    pub(crate) fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// The node this handle refers to
    pub fn node(&self) -> NodeId {
        self.node
    }
}
