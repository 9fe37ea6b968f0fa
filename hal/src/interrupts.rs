//! # Interrupt Controller
//!
//! The boot sequencer must not enable interrupts before the process and
//! thread machinery is fully constructed; this model keeps the controller
//! state explicit so that ordering bugs trip asserts instead of races.

use crate::{HalError, HalResult};
use log::{debug, info};

/// The machine's interrupt controller
pub struct InterruptController {
    present: bool,
    enabled: bool,
}

impl InterruptController {
    /// Create a controller in its reset state (interrupts masked)
    pub const fn new() -> Self {
        Self {
            present: false,
            enabled: false,
        }
    }

    /// Bring the controller online
    pub fn init(&mut self) -> HalResult<()> {
        if self.present {
            return Err(HalError::AlreadyInitialized);
        }
        self.present = true;
        debug!("intr: controller online, interrupts masked");
        Ok(())
    }

    /// Unmask interrupts
    pub fn enable(&mut self) {
        assert!(self.present, "interrupts enabled before controller init");
        self.enabled = true;
        info!("intr: interrupts enabled");
    }

    /// Mask interrupts
    pub fn disable(&mut self) {
        self.enabled = false;
        debug!("intr: interrupts disabled");
    }

    /// Check whether interrupts are currently unmasked
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Check whether the controller has been brought up
    pub fn present(&self) -> bool {
        self.present
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_after_init() {
        let mut intr = InterruptController::new();
        intr.init().unwrap();
        intr.enable();
        assert!(intr.enabled());
        intr.disable();
        assert!(!intr.enabled());
    }

    #[test]
    #[should_panic(expected = "before controller init")]
    fn enable_without_init_panics() {
        let mut intr = InterruptController::new();
        intr.enable();
    }

    #[test]
    fn double_init_rejected() {
        let mut intr = InterruptController::new();
        intr.init().unwrap();
        assert_eq!(intr.init(), Err(HalError::AlreadyInitialized));
    }
}
