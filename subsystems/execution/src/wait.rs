//! # Wait/Reap Protocol
//!
//! The parent-blocks-until-child-exits contract. This is the only
//! synchronization primitive exposed at this layer, and it is built
//! entirely from thread state transitions: there is no lock object.
//! Blocking itself is the caller's move (`Control::Block`); this module
//! only answers "reap now, would block, or no such child".

use crate::state::ExecState;
use crate::process::ProcessState;
use crate::{ExecError, ExecResult, Pid};
use log::debug;

/// Which children a wait call matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    /// Any child of the calling process
    Any,
    /// One specific child
    Child(Pid),
}

impl WaitTarget {
    fn matches(self, pid: Pid) -> bool {
        match self {
            WaitTarget::Any => true,
            WaitTarget::Child(want) => want == pid,
        }
    }
}

/// Outcome of one wait poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPoll {
    /// A zombie child was found; its status was retrieved and its record
    /// destroyed
    Reaped(Pid, i32),
    /// Matching children exist but none has exited yet; the caller should
    /// block and poll again on wake
    WouldBlock,
}

impl<T> ExecState<T> {
    /// Search the calling process's children for a zombie to reap
    ///
    /// Distinguishes "no matching child exists at all" (an error the
    /// caller handles) from "children exist but none has exited yet"
    /// (block and retry). A reaped child is unlinked and destroyed; it is
    /// never returned twice.
    pub fn wait_poll(&mut self, target: WaitTarget) -> ExecResult<WaitPoll> {
        let waiter = self
            .current_process()
            .expect("wait_poll outside any thread context");
        let parent = self
            .processes
            .lookup(waiter)
            .expect("current process not live");

        let matching: alloc::vec::Vec<Pid> = parent
            .children()
            .iter()
            .copied()
            .filter(|&c| target.matches(c))
            .collect();
        if matching.is_empty() {
            return Err(ExecError::NoChildren);
        }

        for child in matching {
            let is_zombie = self
                .processes
                .lookup(child)
                .map(|p| p.state() == ProcessState::Zombie)
                .unwrap_or(false);
            if !is_zombie {
                continue;
            }

            let zombie = self
                .processes
                .remove(child)
                .expect("zombie vanished during reap");
            let status = zombie
                .exit_status()
                .expect("zombie without a recorded exit status");
            for &tid in zombie.threads() {
                self.threads.remove(tid);
            }
            self.processes
                .lookup_mut(waiter)
                .expect("current process not live")
                .remove_child(child);
            debug!(
                "wait: {:?} reaped {:?} (\"{}\") with status {}",
                waiter,
                child,
                zombie.label(),
                status
            );
            return Ok(WaitPoll::Reaped(child, status));
        }

        Ok(WaitPoll::WouldBlock)
    }
}
