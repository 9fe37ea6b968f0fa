//! # Scheduler Handoff
//!
//! Cooperative, single-core: a running thread keeps the processor until
//! it blocks or exits, and the handoff only decides who goes next. The
//! queue implementation is pluggable behind [`queue::RunQueue`].

pub mod queue;

use crate::Tid;
use alloc::boxed::Box;
use queue::{FifoQueue, RunQueue};

/// The run/block bookkeeping behind the handoff
pub struct Scheduler {
    queue: Box<dyn RunQueue>,
}

impl Scheduler {
    /// Create a scheduler with FIFO admission
    pub fn new() -> Self {
        Self {
            queue: Box::new(FifoQueue::new()),
        }
    }

    /// Create a scheduler over a custom run queue
    pub fn with_queue(queue: Box<dyn RunQueue>) -> Self {
        Self { queue }
    }

    /// Admit a thread to the runnable set
    ///
    /// Does not itself cause a switch.
    pub fn admit(&mut self, tid: Tid) {
        self.queue.enqueue(tid);
    }

    /// Pick the thread whose context becomes active next
    pub fn next(&mut self) -> Option<Tid> {
        self.queue.dequeue()
    }

    /// Withdraw a thread from the runnable set
    pub fn withdraw(&mut self, tid: Tid) -> bool {
        self.queue.remove(tid)
    }

    /// Number of runnable threads awaiting the handoff
    pub fn runnable(&self) -> usize {
        self.queue.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
