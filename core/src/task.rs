//! # Kernel Tasks
//!
//! A thread's entry is a task: a resumable unit the dispatch loop drives.
//! Where the original convention is "an entry function that never
//! returns", here a resumption always ends in a [`Control`] transition,
//! and a task that is blocked resumes at its own recorded stage rather
//! than mid-stack. Arguments the entry needs are captured in the task
//! value at construction.

use crate::kernel::Kernel;
use alloc::boxed::Box;
use mica_execution::Control;

/// A resumable thread entry
pub trait KernelTask: Send {
    /// Run until the thread yields the processor
    ///
    /// Called with the whole kernel; the task's own thread is the current
    /// one. The returned transition is applied by the dispatch loop.
    fn resume(&mut self, kernel: &mut Kernel) -> Control;
}

/// Boxed task, as stored in the thread arena
pub type TaskBox = Box<dyn KernelTask>;

impl<F> KernelTask for F
where
    F: FnMut(&mut Kernel) -> Control + Send,
{
    fn resume(&mut self, kernel: &mut Kernel) -> Control {
        self(kernel)
    }
}
