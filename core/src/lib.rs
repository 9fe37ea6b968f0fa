//! # Mica Kernel Core
//!
//! The bootstrap sequencer and the cooperative dispatch loop: the code
//! that takes the machine from hardware bring-up to a running idle/init
//! process pair, supervises init through the wait/reap protocol, and
//! drives the orderly shutdown that ends at the halt latch.
//!
//! The whole kernel for one boot is a single owned [`Kernel`] value;
//! [`boot::KernelBuilder::boot`] runs the one-shot sequence to completion
//! and hands the halted kernel back for inspection.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod boot;
pub mod devnodes;
pub mod executor;
pub mod idle;
pub mod init;
pub mod kernel;
pub mod shell;
pub mod task;

mod tests;

pub use boot::KernelBuilder;
pub use kernel::Kernel;
pub use task::{KernelTask, TaskBox};
