//! Whole-boot scenarios: builder to halt latch, with the console and the
//! recorded init exit as the observables.

#[cfg(test)]
mod tests {
    use crate::devnodes;
    use crate::kernel::Kernel;
    use crate::shell::Shell;
    use crate::task::TaskBox;
    use crate::KernelBuilder;
    use alloc::boxed::Box;
    use mica_execution::thread::{BlockReason, ThreadFlags};
    use mica_execution::wait::{WaitPoll, WaitTarget};
    use mica_execution::{Control, Pid};
    use mica_fs::{FsError, OpenFlags};
    use mica_hal::mem::AddressSpaceId;

    #[test]
    fn default_boot_runs_to_a_clean_halt() {
        let kernel = KernelBuilder::new().boot();

        assert!(kernel.machine.halted());
        assert!(!kernel.machine.intr.enabled());
        assert_eq!(kernel.init_exit(), Some((Pid::INIT, 0)));
        // the display teardown line is the machine's last word
        assert_eq!(kernel.machine.console.lines(), ["mica: halted cleanly"]);

        let vfs = kernel.vfs.as_ref().unwrap();
        assert_eq!(vfs.live_refs(), 0);
        assert_eq!(vfs.lookup("/"), Err(FsError::Offline));
    }

    #[test]
    fn init_exit_status_is_propagated() {
        let kernel = KernelBuilder::new()
            .init_task(Box::new(|_: &mut Kernel| Control::Exit(7)))
            .boot();
        assert_eq!(kernel.init_exit(), Some((Pid::INIT, 7)));
    }

    #[test]
    fn boot_without_a_filesystem() {
        let kernel = KernelBuilder::new().without_filesystem().boot();
        assert!(kernel.machine.halted());
        assert!(kernel.vfs.is_none());
        assert_eq!(kernel.init_exit(), Some((Pid::INIT, 0)));
    }

    #[test]
    fn device_tree_survives_a_second_pass() {
        let kernel = KernelBuilder::new()
            .terminals(3)
            .disks(2)
            .init_task(Box::new(|kernel: &mut Kernel| {
                let vfs = kernel.vfs.as_mut().unwrap();
                let before = vfs.node_count();
                devnodes::populate(vfs, 3, 2).unwrap();
                assert_eq!(vfs.node_count(), before);
                Control::Exit(0)
            }))
            .boot();
        assert_eq!(kernel.init_exit(), Some((Pid::INIT, 0)));
    }

    #[test]
    fn late_init_hooks_run_before_init() {
        let kernel = KernelBuilder::new()
            .late_init(Box::new(|kernel: &mut Kernel| {
                kernel.machine.console.write_line("hook ran");
                // init does not exist yet at hook time
                assert!(kernel.exec.processes.lookup(Pid::INIT).is_none());
            }))
            .boot();
        assert_eq!(
            kernel.machine.console.lines(),
            ["hook ran", "mica: halted cleanly"]
        );
    }

    #[test]
    fn spawned_children_get_fresh_identifiers() {
        let mut child = None;
        let kernel = KernelBuilder::new()
            .init_task(Box::new(move |kernel: &mut Kernel| {
                let Some(pid) = child else {
                    let pid = kernel.exec.process_create("child");
                    assert_eq!(pid.as_u64(), 2);
                    let tid = kernel
                        .exec
                        .thread_create(
                            pid,
                            Box::new(|_: &mut Kernel| Control::Exit(5)) as TaskBox,
                            ThreadFlags::KERNEL,
                            &mut kernel.machine.frames,
                            AddressSpaceId::KERNEL,
                        )
                        .unwrap();
                    kernel.exec.make_runnable(tid);
                    child = Some(pid);
                    return Control::Block(BlockReason::Child);
                };
                match kernel.exec.wait_poll(WaitTarget::Child(pid)).unwrap() {
                    WaitPoll::Reaped(reaped, status) => {
                        assert_eq!(reaped, pid);
                        Control::Exit(status)
                    }
                    WaitPoll::WouldBlock => Control::Block(BlockReason::Child),
                }
            }))
            .boot();
        assert_eq!(kernel.init_exit(), Some((Pid::INIT, 5)));
    }

    #[test]
    fn shell_echoes_to_the_display() {
        let kernel = KernelBuilder::new()
            .init_task(Box::new(|kernel: &mut Kernel| {
                let vfs = kernel.vfs.as_mut().unwrap();
                let mut shell = Shell::create(vfs, 0).unwrap();
                shell.feed_line(&mut kernel.machine.console, "hello");
                shell.destroy(kernel.vfs.as_mut().unwrap());
                Control::Exit(0)
            }))
            .boot();
        assert_eq!(
            kernel.machine.console.lines(),
            ["tty0: hello", "mica: halted cleanly"]
        );
    }

    #[test]
    #[should_panic(expected = "vfs shutdown failed")]
    fn leaked_reference_fails_the_shutdown() {
        KernelBuilder::new()
            .init_task(Box::new(|kernel: &mut Kernel| {
                let vfs = kernel.vfs.as_mut().unwrap();
                let _leak = vfs.open("/dev/null", OpenFlags::READ).unwrap();
                Control::Exit(0)
            }))
            .boot();
    }
}
