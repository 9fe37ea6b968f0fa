//! # Process Management
//!
//! Processes are the resource-owning unit: identity, parent/child links,
//! owned threads, and a counted working-directory reference. The table is
//! an arena indexed by PID; the first two slots are the reserved idle and
//! init identifiers, everything after is allocated monotonically and
//! never recycled.

use crate::{Pid, Tid};
use alloc::string::String;
use alloc::vec::Vec;
use log::debug;
use mica_fs::vfs::NodeHandle;

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// At least one thread has not exited, or no thread was created yet
    Live,
    /// All threads exited; exit status awaits a reaping party
    Zombie,
}

/// Process structure
pub struct Process {
    pid: Pid,
    parent: Option<Pid>,
    label: String,
    state: ProcessState,
    children: Vec<Pid>,
    threads: Vec<Tid>,
    exit_status: Option<i32>,
    cwd: Option<NodeHandle>,
}

impl Process {
    fn new(pid: Pid, parent: Option<Pid>, label: impl Into<String>) -> Self {
        Self {
            pid,
            parent,
            label: label.into(),
            state: ProcessState::Live,
            children: Vec::new(),
            threads: Vec::new(),
            exit_status: None,
            cwd: None,
        }
    }

    /// Get process ID
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Get the parent PID; `None` only for the root (idle) process
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Re-record the parent (orphan reparenting policy)
    pub fn set_parent(&mut self, parent: Pid) {
        self.parent = Some(parent);
    }

    /// Debug label supplied at creation
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get lifecycle state
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Child PIDs
    pub fn children(&self) -> &[Pid] {
        &self.children
    }

    /// Link a child
    pub fn add_child(&mut self, child: Pid) {
        self.children.push(child);
    }

    /// Unlink a child (reap or reparent)
    pub fn remove_child(&mut self, child: Pid) {
        self.children.retain(|&c| c != child);
    }

    /// Drain all children (the process is exiting before reaping them)
    pub fn take_children(&mut self) -> Vec<Pid> {
        core::mem::take(&mut self.children)
    }

    /// Owned thread IDs
    pub fn threads(&self) -> &[Tid] {
        &self.threads
    }

    /// Register an owned thread
    pub fn add_thread(&mut self, tid: Tid) {
        self.threads.push(tid);
    }

    /// Install the working-directory reference, returning any previous one
    /// so the caller can release it (the count moves exactly once per
    /// holder)
    pub fn replace_cwd(&mut self, cwd: NodeHandle) -> Option<NodeHandle> {
        self.cwd.replace(cwd)
    }

    /// Take the working-directory reference out for release
    pub fn take_cwd(&mut self) -> Option<NodeHandle> {
        self.cwd.take()
    }

    /// Check whether a working-directory reference is held
    pub fn has_cwd(&self) -> bool {
        self.cwd.is_some()
    }

    /// Record the exit status and become a zombie
    pub fn zombify(&mut self, status: i32) {
        assert_eq!(self.state, ProcessState::Live, "process zombified twice");
        assert!(self.cwd.is_none(), "zombie still holds its cwd reference");
        self.state = ProcessState::Zombie;
        self.exit_status = Some(status);
    }

    /// Exit status, once recorded
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }
}

/// Arena of all process records
pub struct ProcessTable {
    slots: Vec<Option<Process>>,
}

impl ProcessTable {
    /// Create an empty table
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocate the next PID and create a process record
    ///
    /// Links the new process as a child of `parent` when one is given.
    pub fn create(&mut self, label: &str, parent: Option<Pid>) -> Pid {
        let pid = Pid::new(self.slots.len() as u64);
        debug!("proc: creating \"{}\" as {:?} (parent {:?})", label, pid, parent);
        self.slots.push(Some(Process::new(pid, parent, label)));
        if let Some(parent) = parent {
            self.lookup_mut(parent)
                .unwrap_or_else(|| panic!("parent {:?} not live", parent))
                .add_child(pid);
        }
        pid
    }

    /// Return the live process with this ID, or absent
    pub fn lookup(&self, pid: Pid) -> Option<&Process> {
        self.slots.get(pid.as_u64() as usize)?.as_ref()
    }

    /// Return the live process with this ID mutably, or absent
    pub fn lookup_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.slots.get_mut(pid.as_u64() as usize)?.as_mut()
    }

    /// Destroy a process record, taking ownership out of the arena
    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        self.slots.get_mut(pid.as_u64() as usize)?.take()
    }

    /// Number of live records
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Iterate over live records
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
