//! # Kernel Debug Log
//!
//! Boot-time sink for the `log` facade, standing in for the serial debug
//! port. Records are kept in a bounded in-memory ring so tests can inspect
//! the boot trace.

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Number of records the ring retains
const CAPACITY: usize = 256;

struct DebugSink {
    records: Mutex<VecDeque<String>>,
}

impl Log for DebugSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut records = self.records.lock();
        if records.len() == CAPACITY {
            records.pop_front();
        }
        records.push_back(format!("[{}] {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

static SINK: DebugSink = DebugSink {
    records: Mutex::new(VecDeque::new()),
};

/// Install the debug sink
///
/// First step of hardware bring-up. Tolerates repeated calls (every boot
/// in a test process goes through it) by keeping whichever logger won.
pub fn init() {
    if log::set_logger(&SINK).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

/// Drain the recorded debug output
pub fn drain() -> Vec<String> {
    SINK.records.lock().drain(..).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_captured_and_drained() {
        init();
        log::info!("logging smoke marker");
        // other boots may be logging concurrently; only our record matters
        assert!(drain().iter().any(|l| l.contains("logging smoke marker")));
    }
}
