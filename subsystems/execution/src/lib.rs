//! # Mica Execution Subsystem
//!
//! The execution subsystem manages:
//! - Execution contexts and the switch engine
//! - Thread creation and the thread state machine
//! - Process abstraction and the PID namespace
//! - Cooperative scheduler handoff
//! - The wait/reap protocol
//!
//! ## Key Principle
//!
//! At most one execution context is active at any instant. Everything in
//! this crate is owned state reached from [`state::ExecState`]; there are
//! no global registries, and no locks beyond that single-active invariant.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod context;
pub mod process;
pub mod scheduler;
pub mod state;
pub mod thread;
pub mod wait;

pub use state::ExecState;
pub use thread::states::BlockReason;

use static_assertions::const_assert;

/// Unique identifier for threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tid(u64);

impl Tid {
    /// Create a thread ID from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Unique identifier for processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u64);

impl Pid {
    /// The idle process: the first process created after boot
    pub const IDLE: Self = Self(0);

    /// The init process: the idle process's one architectural child
    pub const INIT: Self = Self(1);

    /// Create a process ID from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check whether this is one of the reserved bootstrap identifiers
    pub const fn is_reserved(self) -> bool {
        self.0 <= Self::INIT.0
    }
}

// The PID namespace hands the reserved identifiers out in creation order.
const_assert!(Pid::IDLE.as_u64() + 1 == Pid::INIT.as_u64());

/// Execution result type
pub type ExecResult<T> = Result<T, ExecError>;

/// Execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    /// Stack or record allocation failed
    OutOfMemory,
    /// Process not found
    ProcessNotFound,
    /// Thread not found
    ThreadNotFound,
    /// The calling process has no matching children, now or ever
    NoChildren,
    /// Operation not valid in the current lifecycle state
    InvalidState,
}

/// What a running thread does with the processor when it returns control
///
/// This is the continuation-style rendering of "functions that never
/// return": a resumption always ends in one of these transitions, and the
/// dispatch loop applies it.
#[derive(Debug)]
pub enum Control {
    /// Stay runnable; hand the processor to the next runnable thread
    Yield,
    /// Suspend until an awaited event makes the thread runnable again
    Block(BlockReason),
    /// Terminate the thread with an exit status
    Exit(i32),
    /// The machine has been halted; nothing runs after this
    Halt,
}
