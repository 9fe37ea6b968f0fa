//! # Console
//!
//! The machine's observable output: a line buffer standing in for the
//! display terminal. Tests assert on its contents.

use alloc::string::String;
use alloc::vec::Vec;

/// Terminal line buffer
#[derive(Default)]
pub struct Console {
    lines: Vec<String>,
}

impl Console {
    /// Create an empty console
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Write one line to the console
    pub fn write_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Everything written so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
