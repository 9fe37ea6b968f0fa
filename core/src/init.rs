//! # Init Process
//!
//! The stock entry for the init process: verify the device tree by
//! opening the first terminal, then exit cleanly. Boots that want real
//! work swap this out via [`crate::KernelBuilder::init_task`]; everything
//! init spawns and fails to reap is handed to idle on exit.

use crate::kernel::Kernel;
use crate::task::KernelTask;
use log::info;
use mica_execution::Control;
use mica_fs::OpenFlags;

/// The stock init entry
pub struct InitTask;

impl InitTask {
    /// A fresh init task
    pub fn new() -> Self {
        Self
    }
}

impl KernelTask for InitTask {
    fn resume(&mut self, kernel: &mut Kernel) -> Control {
        if let Some(vfs) = kernel.vfs.as_mut() {
            let tty = match vfs.open("/dev/tty0", OpenFlags::READ) {
                Ok(handle) => handle,
                Err(err) => panic!("init: no terminal device: {:?}", err),
            };
            vfs.close(tty);
        }
        info!("init: nothing to do, exiting");
        Control::Exit(0)
    }
}

impl Default for InitTask {
    fn default() -> Self {
        Self::new()
    }
}
