//! # Mica HAL - Hardware Abstraction Layer
//!
//! This crate models the hardware the lifecycle core boots on. Everything
//! here is a deterministic simulation of the machine: allocators hand out
//! addresses that are never dereferenced, the interrupt controller is a
//! pair of flags with ordering asserts, and `halt` is a latch instead of
//! `cli; hlt`. The point is that the boot sequencer consumes these
//! interfaces in exactly the order a real machine would require, and the
//! simulation makes ordering violations observable.
//!
//! Every operation at this boundary is "infallible or fatal": callers in
//! the boot path do not retry a failed bring-up step.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod console;
pub mod cpu;
pub mod devices;
pub mod interrupts;
pub mod logging;
pub mod machine;
pub mod mem;

pub use machine::Machine;

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Errors that can occur in HAL operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Memory allocation failed
    OutOfMemory,
    /// Subsystem used before its bring-up step
    NotInitialized,
    /// Bring-up step ran twice
    AlreadyInitialized,
    /// Hardware reported an error
    HardwareError,
    /// Invalid parameter provided
    InvalidParameter,
}

/// Physical address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Create a physical address
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Get the raw address value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Virtual address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u64);

impl VirtAddr {
    /// Create a virtual address
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Get the raw address value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}
