//! # Thread Structure
//!
//! Core thread data structure, generic over the entry task type `T`.
//! The original `entry(arg1, arg2)` argument pair is state captured in
//! the task value at construction.

use super::{BlockReason, ThreadState};
use crate::context::ExecutionContext;
use crate::{Pid, Tid};

/// Thread flags
pub mod flags {
    use bitflags::bitflags;

    bitflags! {
        /// Thread flags
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct ThreadFlags: u32 {
            /// Thread runs in kernel space
            const KERNEL = 1 << 0;
            /// Thread belongs to the idle process
            const IDLE = 1 << 1;
            /// Thread belongs to the init process
            const INIT = 1 << 2;
        }
    }
}

pub use flags::ThreadFlags;

/// Thread structure
///
/// Owns its stack and execution context exclusively; both leave the
/// system together when the thread record is destroyed.
pub struct Thread<T> {
    id: Tid,
    process: Pid,
    state: ThreadState,
    flags: ThreadFlags,
    context: ExecutionContext,
    entry: Option<T>,
    block_reason: Option<BlockReason>,
    exit_status: Option<i32>,
}

impl<T> Thread<T> {
    /// Create a new thread in the `Created` state
    pub fn new(id: Tid, process: Pid, context: ExecutionContext, entry: T, flags: ThreadFlags) -> Self {
        Self {
            id,
            process,
            state: ThreadState::Created,
            flags,
            context,
            entry: Some(entry),
            block_reason: None,
            exit_status: None,
        }
    }

    /// Get thread ID
    pub fn id(&self) -> Tid {
        self.id
    }

    /// Get owning process ID (non-owning back-reference)
    pub fn process(&self) -> Pid {
        self.process
    }

    /// Get current state
    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// Transition to a new state
    ///
    /// Illegal transitions indicate scheduler bugs and fail hard.
    pub fn set_state(&mut self, state: ThreadState) {
        assert!(
            self.state.valid_transitions().contains(&state),
            "thread {:?}: illegal transition {:?} -> {:?}",
            self.id,
            self.state,
            state
        );
        self.state = state;
    }

    /// Get flags
    pub fn flags(&self) -> ThreadFlags {
        self.flags
    }

    /// Get the execution context
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Get the execution context mutably (switch engine use)
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Take the entry task out for a resumption
    pub fn take_entry(&mut self) -> Option<T> {
        self.entry.take()
    }

    /// Put the entry task back after a resumption that did not exit
    pub fn store_entry(&mut self, entry: T) {
        debug_assert!(self.entry.is_none());
        self.entry = Some(entry);
    }

    /// Why the thread is blocked, if it is
    pub fn block_reason(&self) -> Option<BlockReason> {
        self.block_reason
    }

    /// Record the blocking reason (entering `Blocked`)
    pub fn set_block_reason(&mut self, reason: Option<BlockReason>) {
        self.block_reason = reason;
    }

    /// Terminate the thread with an exit status
    pub fn exit(&mut self, status: i32) {
        self.set_state(ThreadState::Exited);
        self.exit_status = Some(status);
        self.entry = None;
    }

    /// Exit status, once the thread has exited
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_hal::mem::{AddressSpaceId, FrameAllocator, KernelStack};

    fn thread(frames: &mut FrameAllocator) -> Thread<()> {
        let stack = KernelStack::allocate(frames).unwrap();
        let ctx = ExecutionContext::new(stack, AddressSpaceId::KERNEL);
        Thread::new(Tid::new(0), Pid::IDLE, ctx, (), ThreadFlags::KERNEL)
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut frames = FrameAllocator::default();
        let mut t = thread(&mut frames);
        assert_eq!(t.state(), ThreadState::Created);
        t.set_state(ThreadState::Runnable);
        t.set_state(ThreadState::Running);
        t.exit(0);
        assert_eq!(t.state(), ThreadState::Exited);
        assert_eq!(t.exit_status(), Some(0));
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn created_cannot_run_directly() {
        let mut frames = FrameAllocator::default();
        let mut t = thread(&mut frames);
        t.set_state(ThreadState::Running);
    }
}
