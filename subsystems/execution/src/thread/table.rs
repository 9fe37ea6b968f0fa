//! # Thread Table
//!
//! Arena of thread records indexed by thread ID. Slots keep an explicit
//! absence marker after destruction; identifiers are never reused.

use super::{Thread, ThreadFlags};
use crate::context::ExecutionContext;
use crate::{Pid, Tid};
use alloc::vec::Vec;

/// Arena of all thread records
pub struct ThreadTable<T> {
    slots: Vec<Option<Thread<T>>>,
}

impl<T> ThreadTable<T> {
    /// Create an empty table
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create a thread record, transferring ownership of its context into
    /// the arena; returns the new thread's ID
    pub fn create(
        &mut self,
        process: Pid,
        context: ExecutionContext,
        entry: T,
        flags: ThreadFlags,
    ) -> Tid {
        let tid = Tid::new(self.slots.len() as u64);
        self.slots
            .push(Some(Thread::new(tid, process, context, entry, flags)));
        tid
    }

    /// Get a thread by ID
    pub fn get(&self, tid: Tid) -> Option<&Thread<T>> {
        self.slots.get(tid.as_u64() as usize)?.as_ref()
    }

    /// Get a thread by ID, mutably
    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut Thread<T>> {
        self.slots.get_mut(tid.as_u64() as usize)?.as_mut()
    }

    /// Destroy a thread record, taking ownership out of the arena
    ///
    /// The record's stack and context go with it.
    pub fn remove(&mut self, tid: Tid) -> Option<Thread<T>> {
        self.slots.get_mut(tid.as_u64() as usize)?.take()
    }

    /// Number of live records
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Iterate over live records
    pub fn iter(&self) -> impl Iterator<Item = &Thread<T>> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

impl<T> Default for ThreadTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_hal::mem::{AddressSpaceId, FrameAllocator, KernelStack};

    fn ctx(frames: &mut FrameAllocator) -> ExecutionContext {
        ExecutionContext::new(KernelStack::allocate(frames).unwrap(), AddressSpaceId::KERNEL)
    }

    #[test]
    fn ids_are_never_reused() {
        let mut frames = FrameAllocator::default();
        let mut table: ThreadTable<()> = ThreadTable::new();

        let a = table.create(Pid::IDLE, ctx(&mut frames), (), ThreadFlags::KERNEL);
        table.remove(a).unwrap();
        assert!(table.get(a).is_none());

        let b = table.create(Pid::IDLE, ctx(&mut frames), (), ThreadFlags::KERNEL);
        assert_ne!(a, b);
        assert_eq!(table.count(), 1);
    }
}
