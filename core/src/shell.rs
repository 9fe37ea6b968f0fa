//! # Shell Harness
//!
//! A minimal interactive surface bound to one terminal: it holds an open
//! reference on its tty node for its whole lifetime and echoes fed lines
//! to the display. Exists so a custom init task has a user-visible thing
//! to run; the reference it holds is exactly the kind of thing the
//! shutdown symmetry check catches when leaked.

use alloc::format;
use mica_fs::vfs::NodeHandle;
use mica_fs::{FsResult, OpenFlags, Vfs};
use mica_hal::console::Console;

/// A shell bound to one terminal unit
pub struct Shell {
    terminal: u16,
    tty: NodeHandle,
}

impl Shell {
    /// Attach a shell to terminal `terminal`, opening its device node
    pub fn create(vfs: &mut Vfs, terminal: u16) -> FsResult<Self> {
        let path = format!("/dev/tty{}", terminal);
        let tty = vfs.open(&path, OpenFlags::READ | OpenFlags::WRITE)?;
        Ok(Self { terminal, tty })
    }

    /// The terminal unit this shell is bound to
    pub fn terminal(&self) -> u16 {
        self.terminal
    }

    /// Process one input line
    pub fn feed_line(&mut self, console: &mut Console, line: &str) {
        console.write_line(format!("tty{}: {}", self.terminal, line));
    }

    /// Detach, releasing the terminal reference
    pub fn destroy(self, vfs: &mut Vfs) {
        vfs.close(self.tty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devnodes;
    use mica_fs::FsError;

    #[test]
    fn holds_a_reference_while_attached() {
        let mut vfs = Vfs::new();
        devnodes::populate(&mut vfs, 2, 1).unwrap();
        let mut console = Console::new();

        let mut shell = Shell::create(&mut vfs, 0).unwrap();
        assert_eq!(vfs.live_refs(), 1);
        shell.feed_line(&mut console, "hello");
        assert_eq!(console.lines(), ["tty0: hello"]);

        shell.destroy(&mut vfs);
        assert_eq!(vfs.live_refs(), 0);
    }

    #[test]
    fn missing_terminal_is_an_error() {
        let mut vfs = Vfs::new();
        devnodes::populate(&mut vfs, 1, 1).unwrap();
        assert!(matches!(
            Shell::create(&mut vfs, 5),
            Err(FsError::NotFound)
        ));
    }
}
