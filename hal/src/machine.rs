//! # Machine
//!
//! Aggregate of the simulated hardware. One `Machine` is owned per boot;
//! nothing here is global, so independent boots (and tests) cannot
//! interfere with each other.

use crate::console::Console;
use crate::cpu::Cpu;
use crate::devices::DeviceClasses;
use crate::interrupts::InterruptController;
use crate::mem::{AddressSpaces, FrameAllocator, PageCache};
use crate::{logging, HalResult};
use log::info;

/// The simulated machine
pub struct Machine {
    /// The single CPU
    pub cpu: Cpu,
    /// Interrupt controller
    pub intr: InterruptController,
    /// Physical frame allocator
    pub frames: FrameAllocator,
    /// Address-space machinery
    pub spaces: AddressSpaces,
    /// Page cache
    pub page_cache: PageCache,
    /// Device classes
    pub devices: DeviceClasses,
    /// Display terminal output
    pub console: Console,
}

impl Machine {
    /// Create a machine with the given terminal and disk unit counts
    pub fn new(nterms: usize, ndisks: usize) -> Self {
        Self {
            cpu: Cpu::new(),
            intr: InterruptController::new(),
            frames: FrameAllocator::default(),
            spaces: AddressSpaces::new(),
            page_cache: PageCache::new(),
            devices: DeviceClasses::new(nterms, ndisks),
            console: Console::new(),
        }
    }

    /// Hardware bring-up
    ///
    /// Debug log, memory, descriptor tables, interrupt controller, CPU
    /// identification, in that order. Runs before any process or thread
    /// exists; a failure here leaves nothing worth recovering.
    pub fn early_init(&mut self) -> HalResult<()> {
        logging::init();
        info!("mica: hardware bring-up");
        self.page_cache.init()?;
        self.cpu.load_descriptor_tables();
        self.intr.init()?;
        self.cpu.identify();
        Ok(())
    }

    /// Disable interrupts and stop the processor permanently
    ///
    /// The display teardown hook fires first; its console line is the last
    /// observable action of the machine.
    pub fn halt(&mut self) {
        self.devices.display_shutdown(&mut self.console);
        self.intr.disable();
        self.cpu.halt();
    }

    /// Check the halt latch
    pub fn halted(&self) -> bool {
        self.cpu.halted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bring_up_then_halt() {
        let mut machine = Machine::new(2, 1);
        machine.early_init().unwrap();
        assert!(machine.intr.present());
        assert!(!machine.intr.enabled());
        machine.intr.enable();
        machine.halt();
        assert!(machine.halted());
        assert!(!machine.intr.enabled());
        assert_eq!(machine.console.lines().len(), 1);
    }
}
