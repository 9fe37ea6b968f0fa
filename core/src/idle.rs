//! # Idle Process
//!
//! The first process. Its thread finishes kernel bring-up from thread
//! context, spawns init, and then sits in the wait protocol as the
//! reaper of last resort until init exits. Init's exit is the shutdown
//! signal: idle tears the kernel down in reverse bring-up order and
//! latches the halt. Idle is never scheduled for useful work and is
//! never reaped; its context is the one occupying the cpu when the
//! machine stops.

use crate::devnodes;
use crate::kernel::Kernel;
use crate::task::KernelTask;
use log::info;
use mica_execution::thread::{BlockReason, ThreadFlags};
use mica_execution::wait::{WaitPoll, WaitTarget};
use mica_execution::{Control, Pid};
use mica_hal::mem::AddressSpaceId;

enum Stage {
    Setup,
    AwaitInit,
}

/// The idle thread's entry
pub struct IdleTask {
    stage: Stage,
}

impl IdleTask {
    /// A fresh idle task, starting at bring-up
    pub fn new() -> Self {
        Self { stage: Stage::Setup }
    }

    fn setup(&mut self, kernel: &mut Kernel) -> Control {
        // Late subsystems first; hooks may still reshape the kernel.
        kernel.run_late_init();

        // Spawn init before touching the filesystem so its record can
        // hold a working-directory reference.
        let init = kernel.exec.process_create("init");
        assert_eq!(
            init,
            Pid::INIT,
            "init process did not receive the reserved identifier"
        );
        let entry = kernel.take_init_main();
        let init_thread = match kernel.exec.thread_create(
            init,
            entry,
            ThreadFlags::KERNEL | ThreadFlags::INIT,
            &mut kernel.machine.frames,
            AddressSpaceId::KERNEL,
        ) {
            Ok(tid) => tid,
            Err(err) => panic!("ran out of memory while booting: {:?}", err),
        };

        if let Some(vfs) = kernel.vfs.as_mut() {
            // Both boot processes start rooted at "/", each holding its
            // own counted reference.
            let root = vfs.root();
            for pid in [Pid::IDLE, Pid::INIT] {
                let handle = match vfs.acquire(root) {
                    Ok(handle) => handle,
                    Err(err) => panic!("root directory unavailable: {:?}", err),
                };
                let previous = kernel
                    .exec
                    .processes
                    .lookup_mut(pid)
                    .expect("boot process not live")
                    .replace_cwd(handle);
                if let Some(previous) = previous {
                    vfs.close(previous);
                }
            }

            let nterms = kernel.machine.devices.nterms();
            let ndisks = kernel.machine.devices.ndisks();
            if let Err(err) = devnodes::populate(vfs, nterms, ndisks) {
                panic!("device node creation failed: {:?}", err);
            }
        }

        // Point of no return for bring-up: from here on, blocking is
        // allowed and interrupts may fire.
        kernel.machine.intr.enable();

        info!("idle: starting init proc");
        kernel.exec.make_runnable(init_thread);
        self.stage = Stage::AwaitInit;
        self.await_init(kernel)
    }

    fn await_init(&mut self, kernel: &mut Kernel) -> Control {
        match kernel.exec.wait_poll(WaitTarget::Any) {
            Ok(WaitPoll::WouldBlock) => Control::Block(BlockReason::Child),
            Ok(WaitPoll::Reaped(pid, status)) => {
                assert_eq!(pid, Pid::INIT, "reaped a child that is not init");
                info!("idle: init exited with status {}", status);
                kernel.record_init_exit(pid, status);
                self.shutdown(kernel)
            }
            Err(err) => panic!("idle lost its children: {:?}", err),
        }
    }

    /// Reverse bring-up order: filesystem, page cache, display, halt
    fn shutdown(&mut self, kernel: &mut Kernel) -> Control {
        if let Some(mut vfs) = kernel.vfs.take() {
            let cwd = kernel
                .exec
                .processes
                .lookup_mut(Pid::IDLE)
                .expect("idle process not live")
                .take_cwd();
            if let Some(handle) = cwd {
                vfs.close(handle);
            }
            // Every acquire must have been matched by a close by now;
            // an outstanding reference here is a kernel bug.
            if let Err(err) = vfs.shutdown() {
                panic!("vfs shutdown failed: {:?}", err);
            }
            kernel.vfs = Some(vfs);
        }

        if let Err(err) = kernel.machine.page_cache.shutdown() {
            panic!("page cache shutdown failed: {:?}", err);
        }

        kernel.machine.halt();
        Control::Halt
    }
}

impl KernelTask for IdleTask {
    fn resume(&mut self, kernel: &mut Kernel) -> Control {
        match self.stage {
            Stage::Setup => self.setup(kernel),
            Stage::AwaitInit => self.await_init(kernel),
        }
    }
}

impl Default for IdleTask {
    fn default() -> Self {
        Self::new()
    }
}
