//! # Kernel Aggregate
//!
//! One `Kernel` value owns everything a boot produces: the machine, the
//! execution state, the filesystem, and the boot-time observables tests
//! inspect after the halt.

use crate::task::TaskBox;
use alloc::boxed::Box;
use alloc::vec::Vec;
use mica_execution::{ExecState, Pid};
use mica_fs::Vfs;
use mica_hal::Machine;

/// A hook run by the idle thread after process machinery is up but
/// before the filesystem and interrupts come online
pub type LateInitHook = Box<dyn FnOnce(&mut Kernel) + Send>;

/// The whole kernel for one boot
pub struct Kernel {
    /// The simulated machine
    pub machine: Machine,
    /// Execution subsystem state
    pub exec: ExecState<TaskBox>,
    /// The filesystem, when the boot was configured with one
    pub vfs: Option<Vfs>,
    late_init: Vec<LateInitHook>,
    init_main: Option<TaskBox>,
    init_exit: Option<(Pid, i32)>,
}

impl Kernel {
    pub(crate) fn new(
        machine: Machine,
        vfs: Option<Vfs>,
        late_init: Vec<LateInitHook>,
        init_main: Option<TaskBox>,
    ) -> Self {
        Self {
            machine,
            exec: ExecState::new(),
            vfs,
            late_init,
            init_main,
            init_exit: None,
        }
    }

    /// Take the configured init entry, or the stock one
    pub(crate) fn take_init_main(&mut self) -> TaskBox {
        self.init_main
            .take()
            .unwrap_or_else(|| Box::new(crate::init::InitTask::new()))
    }

    /// Run the registered late-init hooks, in registration order
    pub(crate) fn run_late_init(&mut self) {
        let hooks = core::mem::take(&mut self.late_init);
        for hook in hooks {
            hook(self);
        }
    }

    /// Release a process's working-directory reference
    ///
    /// Must run before the process becomes a zombie; the count moves down
    /// exactly once per holder.
    pub(crate) fn on_process_exit(&mut self, pid: Pid) {
        let Some(proc) = self.exec.processes.lookup_mut(pid) else {
            return;
        };
        if let Some(cwd) = proc.take_cwd() {
            let vfs = self
                .vfs
                .as_mut()
                .expect("working-directory reference without a filesystem");
            vfs.close(cwd);
        }
    }

    pub(crate) fn record_init_exit(&mut self, pid: Pid, status: i32) {
        self.init_exit = Some((pid, status));
    }

    /// The identifier and status idle's wait call returned for init
    pub fn init_exit(&self) -> Option<(Pid, i32)> {
        self.init_exit
    }
}
