//! # Mica FS - Virtual Filesystem
//!
//! An in-memory VFS exposing exactly the surface the lifecycle core
//! consumes: path lookup, directory and device-node creation, open/close,
//! counted node references, and an explicit shutdown that fails while any
//! reference is still outstanding. There is no on-disk layout; the node
//! arena is the filesystem.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod vfs;

pub use vfs::{NodeHandle, NodeId, NodeKind, Vfs};

use bitflags::bitflags;

/// Filesystem result type
pub type FsResult<T> = Result<T, FsError>;

/// Filesystem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Path does not name a node
    NotFound,
    /// Path already names a node
    Exists,
    /// An intermediate path component is not a directory
    NotADirectory,
    /// References are still outstanding
    Busy,
    /// Path is not absolute or contains an empty component
    InvalidPath,
    /// Operation after shutdown
    Offline,
}

/// Device identifier: a major number naming the driver class and a minor
/// number naming the unit
///
/// The numbering is a contract shared with the driver subsystem: memory
/// devices are char major 1, terminals char major 2, disks block major 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId {
    /// Driver class
    pub major: u16,
    /// Unit within the class
    pub minor: u16,
}

impl DeviceId {
    /// The null memory device
    pub const NULL: Self = Self::new(1, 0);

    /// The zero memory device
    pub const ZERO: Self = Self::new(1, 1);

    /// Build a device identifier
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// The terminal device for unit `n`
    pub const fn tty(n: u16) -> Self {
        Self::new(2, n)
    }

    /// The disk device for unit `n`
    pub const fn disk(n: u16) -> Self {
        Self::new(1, n)
    }
}

bitflags! {
    /// Open mode flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Open for reading
        const READ = 1 << 0;
        /// Open for writing
        const WRITE = 1 << 1;
    }
}
