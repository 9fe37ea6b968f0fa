//! # Run Queues
//!
//! The run-queue seam the handoff is built over. This core ships FIFO
//! admission only; a priority policy can be layered behind the same trait
//! without touching the thread state machine.

use crate::Tid;
use alloc::collections::VecDeque;

/// A queue of runnable threads
pub trait RunQueue: Send {
    /// Admit a thread
    fn enqueue(&mut self, tid: Tid);

    /// Take the next thread for the handoff
    fn dequeue(&mut self) -> Option<Tid>;

    /// Look at the next thread without removing it
    fn peek(&self) -> Option<Tid>;

    /// Check whether the queue is empty
    fn is_empty(&self) -> bool;

    /// Number of queued threads
    fn len(&self) -> usize;

    /// Remove a specific thread; returns whether it was queued
    fn remove(&mut self, tid: Tid) -> bool;
}

/// Simple FIFO run queue
pub struct FifoQueue {
    queue: VecDeque<Tid>,
}

impl FifoQueue {
    /// Create a new FIFO queue
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl Default for FifoQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RunQueue for FifoQueue {
    fn enqueue(&mut self, tid: Tid) {
        self.queue.push_back(tid);
    }

    fn dequeue(&mut self) -> Option<Tid> {
        self.queue.pop_front()
    }

    fn peek(&self) -> Option<Tid> {
        self.queue.front().copied()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn remove(&mut self, tid: Tid) -> bool {
        if let Some(pos) = self.queue.iter().position(|&t| t == tid) {
            self.queue.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut q = FifoQueue::new();
        q.enqueue(Tid::new(3));
        q.enqueue(Tid::new(1));
        q.enqueue(Tid::new(2));
        assert_eq!(q.peek(), Some(Tid::new(3)));
        assert_eq!(q.dequeue(), Some(Tid::new(3)));
        assert!(q.remove(Tid::new(2)));
        assert_eq!(q.dequeue(), Some(Tid::new(1)));
        assert!(q.is_empty());
    }
}
