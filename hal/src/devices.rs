//! # Device Classes
//!
//! Bring-up for the byte-oriented (terminal) and block-oriented (disk)
//! device classes, and the display shutdown hook that emits the final
//! console line before the processor halts.

use crate::console::Console;
use crate::{HalError, HalResult};
use log::debug;

/// Device class registry
pub struct DeviceClasses {
    nterms: usize,
    ndisks: usize,
    bytedev_online: bool,
    blockdev_online: bool,
    display_down: bool,
}

impl DeviceClasses {
    /// Create the registry for a machine with `nterms` terminal units and
    /// `ndisks` disk units
    pub const fn new(nterms: usize, ndisks: usize) -> Self {
        Self {
            nterms,
            ndisks,
            bytedev_online: false,
            blockdev_online: false,
            display_down: false,
        }
    }

    /// Initialize the byte-oriented device class
    pub fn init_byte_devices(&mut self) -> HalResult<()> {
        if self.bytedev_online {
            return Err(HalError::AlreadyInitialized);
        }
        self.bytedev_online = true;
        debug!("dev: byte device class online ({} terminal unit(s))", self.nterms);
        Ok(())
    }

    /// Initialize the block-oriented device class
    pub fn init_block_devices(&mut self) -> HalResult<()> {
        if self.blockdev_online {
            return Err(HalError::AlreadyInitialized);
        }
        self.blockdev_online = true;
        debug!("dev: block device class online ({} disk unit(s))", self.ndisks);
        Ok(())
    }

    /// Number of terminal units
    pub fn nterms(&self) -> usize {
        self.nterms
    }

    /// Number of disk units
    pub fn ndisks(&self) -> usize {
        self.ndisks
    }

    /// Check whether both device classes are online
    pub fn online(&self) -> bool {
        self.bytedev_online && self.blockdev_online
    }

    /// Display teardown hook
    ///
    /// Emits the one shutdown line. Invoked exactly once, as the last
    /// observable action before the halt latch.
    pub fn display_shutdown(&mut self, console: &mut Console) {
        assert!(!self.display_down, "display shutdown hook ran twice");
        self.display_down = true;
        console.write_line("mica: halted cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_hook_writes_one_line() {
        let mut devices = DeviceClasses::new(1, 1);
        let mut console = Console::new();
        devices.display_shutdown(&mut console);
        assert_eq!(console.lines(), ["mica: halted cleanly"]);
    }

    #[test]
    #[should_panic(expected = "ran twice")]
    fn shutdown_hook_is_one_shot() {
        let mut devices = DeviceClasses::new(1, 1);
        let mut console = Console::new();
        devices.display_shutdown(&mut console);
        devices.display_shutdown(&mut console);
    }
}
