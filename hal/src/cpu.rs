//! # CPU Abstraction
//!
//! CPU identification, descriptor tables, and the halt latch.

use log::{debug, info};

/// Identification data for the (simulated) processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    /// Vendor string
    pub vendor: &'static str,
    /// Model name
    pub model: &'static str,
    /// Number of logical cores (always 1 in this model)
    pub cores: usize,
}

impl CpuInfo {
    /// Query the processor for its identification data
    pub fn identify() -> Self {
        Self {
            vendor: "MicaSim",
            model: "mica virtual cpu",
            cores: 1,
        }
    }
}

/// The single CPU of the machine
pub struct Cpu {
    info: Option<CpuInfo>,
    tables_loaded: bool,
    halted: bool,
}

impl Cpu {
    /// Create a CPU in its reset state
    pub const fn new() -> Self {
        Self {
            info: None,
            tables_loaded: false,
            halted: false,
        }
    }

    /// Load the descriptor tables (GDT/IDT equivalent)
    pub fn load_descriptor_tables(&mut self) {
        assert!(!self.tables_loaded, "descriptor tables loaded twice");
        self.tables_loaded = true;
        debug!("cpu: descriptor tables loaded");
    }

    /// Check whether the descriptor tables are in place
    pub fn tables_loaded(&self) -> bool {
        self.tables_loaded
    }

    /// Identify the processor, caching the result
    pub fn identify(&mut self) -> CpuInfo {
        let info = *self.info.get_or_insert_with(CpuInfo::identify);
        info!("cpu: {} {} ({} core)", info.vendor, info.model, info.cores);
        info
    }

    /// Cached identification data, if `identify` has run
    pub fn info(&self) -> Option<CpuInfo> {
        self.info
    }

    /// Stop the processor permanently
    ///
    /// There is no way back: once the latch is set the dispatch loop will
    /// never run another context.
    pub fn halt(&mut self) {
        assert!(!self.halted, "cpu halted twice");
        self.halted = true;
        info!("cpu: halted");
    }

    /// Check the halt latch
    pub fn halted(&self) -> bool {
        self.halted
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
