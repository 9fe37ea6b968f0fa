//! # VFS Core
//!
//! The node arena and path operations. Paths are absolute and resolved
//! component by component; the working-directory references the lifecycle
//! core hands out are counted here, and `shutdown` refuses to run while
//! any count is nonzero — a leak or double release during boot/teardown
//! shows up as a failed shutdown.

pub mod node;

pub use node::{NodeHandle, NodeId, NodeKind, Vnode};

use crate::{FsError, FsResult, OpenFlags};
use alloc::string::ToString;
use alloc::vec::Vec;
use log::{debug, info};

/// The virtual filesystem for one boot
pub struct Vfs {
    nodes: Vec<Option<Vnode>>,
    root: NodeId,
    online: bool,
}

impl Vfs {
    /// Mount an empty filesystem with a root directory
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Some(Vnode::new(NodeKind::Directory)));
        info!("vfs: root filesystem mounted");
        Self {
            nodes,
            root: NodeId::new(0),
            online: true,
        }
    }

    /// The root directory
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node record
    pub fn node(&self, id: NodeId) -> Option<&Vnode> {
        self.nodes.get(id.index())?.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Vnode> {
        self.nodes.get_mut(id.index())?.as_mut()
    }

    fn check_online(&self) -> FsResult<()> {
        if self.online {
            Ok(())
        } else {
            Err(FsError::Offline)
        }
    }

    /// Split an absolute path into components
    fn components(path: &str) -> FsResult<Vec<&str>> {
        let rest = path.strip_prefix('/').ok_or(FsError::InvalidPath)?;
        if rest.is_empty() {
            return Ok(Vec::new());
        }
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.iter().any(|c| c.is_empty()) {
            return Err(FsError::InvalidPath);
        }
        Ok(parts)
    }

    /// Resolve the parent directory of `path` and its final component
    fn resolve_parent<'p>(&self, path: &'p str) -> FsResult<(NodeId, &'p str)> {
        let mut parts = Self::components(path)?;
        let last = parts.pop().ok_or(FsError::InvalidPath)?;
        let mut dir = self.root;
        for part in parts {
            let node = self.node(dir).ok_or(FsError::NotFound)?;
            if node.kind() != NodeKind::Directory {
                return Err(FsError::NotADirectory);
            }
            dir = *node.children().get(part).ok_or(FsError::NotFound)?;
        }
        if self.node(dir).ok_or(FsError::NotFound)?.kind() != NodeKind::Directory {
            return Err(FsError::NotADirectory);
        }
        Ok((dir, last))
    }

    /// Return the node a path names, or absent
    pub fn lookup(&self, path: &str) -> FsResult<NodeId> {
        self.check_online()?;
        if Self::components(path)?.is_empty() {
            return Ok(self.root);
        }
        let (dir, name) = self.resolve_parent(path)?;
        let parent = self.node(dir).ok_or(FsError::NotFound)?;
        parent.children().get(name).copied().ok_or(FsError::NotFound)
    }

    fn insert(&mut self, path: &str, kind: NodeKind) -> FsResult<NodeId> {
        self.check_online()?;
        let (dir, name) = self.resolve_parent(path)?;
        if self
            .node(dir)
            .ok_or(FsError::NotFound)?
            .children()
            .contains_key(name)
        {
            return Err(FsError::Exists);
        }
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Some(Vnode::new(kind)));
        self.node_mut(dir)
            .expect("parent directory vanished")
            .children_mut()
            .insert(name.to_string(), id);
        debug!("vfs: created {} ({:?})", path, kind);
        Ok(id)
    }

    /// Create a directory
    pub fn mkdir(&mut self, path: &str) -> FsResult<NodeId> {
        self.insert(path, NodeKind::Directory)
    }

    /// Create a node (regular file or device-special node)
    pub fn mknod(&mut self, path: &str, kind: NodeKind) -> FsResult<NodeId> {
        if kind == NodeKind::Directory {
            return Err(FsError::InvalidPath);
        }
        self.insert(path, kind)
    }

    /// Open a node by path, taking a counted reference
    pub fn open(&mut self, path: &str, _flags: OpenFlags) -> FsResult<NodeHandle> {
        let id = self.lookup(path)?;
        self.acquire(id)
    }

    /// Take a counted reference on a node directly (working-directory
    /// acquisition)
    pub fn acquire(&mut self, id: NodeId) -> FsResult<NodeHandle> {
        self.check_online()?;
        self.node_mut(id).ok_or(FsError::NotFound)?.incref();
        Ok(NodeHandle::new(id))
    }

    /// Release a counted reference
    pub fn close(&mut self, handle: NodeHandle) {
        let id = handle.node();
        self.node_mut(id)
            .unwrap_or_else(|| panic!("close of missing node {:?}", id))
            .decref();
    }

    /// Sum of all outstanding references
    pub fn live_refs(&self) -> u32 {
        self.nodes
            .iter()
            .filter_map(|n| n.as_ref())
            .map(|n| n.refcount())
            .sum()
    }

    /// Number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Unmount
    ///
    /// Fails with [`FsError::Busy`] while references are outstanding;
    /// reference-count symmetry over the whole boot is exactly what makes
    /// this succeed.
    pub fn shutdown(&mut self) -> FsResult<()> {
        self.check_online()?;
        let live = self.live_refs();
        if live > 0 {
            return Err(FsError::Busy);
        }
        self.online = false;
        info!("vfs: shut down");
        Ok(())
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceId;

    #[test]
    fn lookup_and_create() {
        let mut vfs = Vfs::new();
        assert_eq!(vfs.lookup("/"), Ok(vfs.root()));
        assert_eq!(vfs.lookup("/dev"), Err(FsError::NotFound));

        let dev = vfs.mkdir("/dev").unwrap();
        assert_eq!(vfs.lookup("/dev"), Ok(dev));
        assert_eq!(vfs.mkdir("/dev"), Err(FsError::Exists));

        let null = vfs
            .mknod("/dev/null", NodeKind::CharDevice(DeviceId::NULL))
            .unwrap();
        assert_eq!(vfs.lookup("/dev/null"), Ok(null));
        assert_eq!(
            vfs.node(null).unwrap().kind().device(),
            Some(DeviceId::NULL)
        );
    }

    #[test]
    fn relative_paths_rejected() {
        let vfs = Vfs::new();
        assert_eq!(vfs.lookup("dev"), Err(FsError::InvalidPath));
        assert_eq!(vfs.lookup("/dev//null"), Err(FsError::InvalidPath));
    }

    #[test]
    fn references_gate_shutdown() {
        let mut vfs = Vfs::new();
        let root = vfs.root();
        let a = vfs.acquire(root).unwrap();
        let b = vfs.acquire(root).unwrap();
        assert_eq!(vfs.live_refs(), 2);

        vfs.close(a);
        assert_eq!(vfs.shutdown(), Err(FsError::Busy));
        vfs.close(b);
        assert_eq!(vfs.shutdown(), Ok(()));
        assert_eq!(vfs.lookup("/"), Err(FsError::Offline));
    }

    #[test]
    #[should_panic(expected = "below zero")]
    fn double_release_panics() {
        let mut vfs = Vfs::new();
        let root = vfs.root();
        let handle = vfs.acquire(root).unwrap();
        let forged = NodeHandle::new(handle.node());
        vfs.close(handle);
        vfs.close(forged);
    }

    #[test]
    fn existence_probe_then_create() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/dev").unwrap();
        // open probes existence; a miss falls back to creation
        match vfs.open("/dev/tty0", OpenFlags::READ) {
            Ok(handle) => vfs.close(handle),
            Err(FsError::NotFound) => {
                vfs.mknod("/dev/tty0", NodeKind::CharDevice(DeviceId::tty(0)))
                    .map(|_| ())
                    .unwrap();
            }
            Err(other) => panic!("unexpected error {:?}", other),
        }
        assert!(vfs.lookup("/dev/tty0").is_ok());
        assert_eq!(vfs.live_refs(), 0);
    }
}
