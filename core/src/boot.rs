//! # Bootstrap Sequencer
//!
//! The one-shot sequence from raw hardware to the running idle process.
//! Strictly ordered and non-reentrant: hardware bring-up, subsystem
//! allocators, drivers, then the bootstrap context — a synthetic
//! execution context on a fresh stack whose activation is the first
//! one-way jump. Inside it the idle process is created and its thread
//! activated (the second one-way jump); everything after that happens in
//! thread context and is driven by the dispatch loop.

use crate::executor;
use crate::idle::IdleTask;
use crate::kernel::{Kernel, LateInitHook};
use crate::task::TaskBox;
use alloc::boxed::Box;
use alloc::vec::Vec;
use log::info;
use mica_execution::context::{ContextOwner, ExecutionContext};
use mica_execution::thread::ThreadFlags;
use mica_execution::Pid;
use mica_fs::Vfs;
use mica_hal::mem::{AddressSpaceId, KernelStack};
use mica_hal::Machine;

/// Boot configuration
///
/// The defaults mirror the classic teaching setup: two terminals, one
/// disk, a root filesystem.
pub struct KernelBuilder {
    nterms: usize,
    ndisks: usize,
    with_fs: bool,
    late_init: Vec<LateInitHook>,
    init_main: Option<TaskBox>,
}

impl KernelBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self {
            nterms: 2,
            ndisks: 1,
            with_fs: true,
            late_init: Vec::new(),
            init_main: None,
        }
    }

    /// Number of terminal units
    pub fn terminals(mut self, nterms: usize) -> Self {
        self.nterms = nterms;
        self
    }

    /// Number of disk units
    pub fn disks(mut self, ndisks: usize) -> Self {
        self.ndisks = ndisks;
        self
    }

    /// Boot without a filesystem (no cwd references, no `/dev`)
    pub fn without_filesystem(mut self) -> Self {
        self.with_fs = false;
        self
    }

    /// Register a late-init hook, run by idle before interrupts enable
    pub fn late_init(mut self, hook: LateInitHook) -> Self {
        self.late_init.push(hook);
        self
    }

    /// Replace the stock init entry
    pub fn init_task(mut self, task: TaskBox) -> Self {
        self.init_main = Some(task);
        self
    }

    /// Run the boot sequence to completion
    ///
    /// Returns the halted kernel. Every fatal bootstrap condition panics
    /// with a diagnostic; nothing in this path is retried.
    pub fn boot(self) -> Kernel {
        // Step 1: hardware/debug bring-up.
        let mut machine = Machine::new(self.nterms, self.ndisks);
        if let Err(err) = machine.early_init() {
            panic!("hardware bring-up failed: {:?}", err);
        }

        // Step 3: driver classes, before any device node is opened.
        if let Err(err) = machine.devices.init_byte_devices() {
            panic!("byte device bring-up failed: {:?}", err);
        }
        if let Err(err) = machine.devices.init_block_devices() {
            panic!("block device bring-up failed: {:?}", err);
        }

        let vfs = self.with_fs.then(Vfs::new);

        // Step 2 completes here: Kernel::new constructs the process and
        // thread arenas before any process or thread exists.
        let mut kernel = Kernel::new(machine, vfs, self.late_init, self.init_main);

        // Step 4: a dedicated boot stack and the bootstrap context.
        let boot_stack = match KernelStack::allocate(&mut kernel.machine.frames) {
            Ok(stack) => stack,
            Err(err) => panic!("ran out of memory while booting: {:?}", err),
        };
        let mut bootstrap_ctx = ExecutionContext::new(boot_stack, AddressSpaceId::KERNEL);
        kernel
            .exec
            .switch
            .activate(ContextOwner::Bootstrap, &mut bootstrap_ctx);

        // Step 5, inside the bootstrap context: finalize the
        // address-space template, create the idle process and its thread.
        kernel.machine.spaces.finalize_template();

        let idle = kernel.exec.process_create("idle");
        assert_eq!(
            idle,
            Pid::IDLE,
            "idle process did not receive the reserved identifier"
        );
        let idle_thread = match kernel.exec.thread_create(
            idle,
            Box::new(IdleTask::new()) as TaskBox,
            ThreadFlags::KERNEL | ThreadFlags::IDLE,
            &mut kernel.machine.frames,
            AddressSpaceId::KERNEL,
        ) {
            Ok(tid) => tid,
            Err(err) => panic!("ran out of memory while booting: {:?}", err),
        };

        info!("boot: starting idle proc");
        kernel.exec.make_runnable(idle_thread);

        // The jump into the idle thread is one-way: the bootstrap context
        // is retired and never revisited.
        kernel
            .exec
            .switch
            .retire(ContextOwner::Bootstrap, &mut bootstrap_ctx);

        // Steps 6-9 run in thread context.
        executor::run_to_halt(&mut kernel);
        assert!(kernel.machine.halted(), "dispatch loop returned before halt");
        kernel
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
