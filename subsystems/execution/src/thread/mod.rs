//! # Thread Management
//!
//! Threads are the schedulable unit: an execution context plus an entry
//! task, a lifecycle state, and exclusive ownership of a stack.

pub mod states;
pub mod table;
#[allow(clippy::module_inception)]
pub mod thread;

pub use states::{BlockReason, ThreadState};
pub use table::ThreadTable;
pub use thread::{Thread, ThreadFlags};
