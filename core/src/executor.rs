//! # Dispatch Loop
//!
//! The cooperative engine behind the scheduler handoff: pick the next
//! runnable thread, activate its context, resume its task, apply the
//! transition it ends with. Runs until the halt latch. A moment with no
//! runnable thread and no halt is a lost wakeup, which this core treats
//! as fatal: there are no timer interrupts here to recover behind our
//! back.

use crate::kernel::Kernel;
use mica_execution::Control;

/// Drive the kernel until the machine halts
pub fn run_to_halt(kernel: &mut Kernel) {
    while !kernel.machine.halted() {
        let Some(tid) = kernel.exec.schedule_next() else {
            panic!("no runnable thread and the machine has not halted");
        };
        let mut task = kernel
            .exec
            .take_entry(tid)
            .expect("scheduled thread has no entry task");

        match task.resume(kernel) {
            Control::Yield => {
                kernel.exec.store_entry(tid, task);
                kernel.exec.yield_current();
            }
            Control::Block(reason) => {
                kernel.exec.store_entry(tid, task);
                kernel.exec.block_current(reason);
            }
            Control::Exit(status) => {
                // task dropped here; the record survives until reaped
                drop(task);
                if let Some(pid) = kernel.exec.exit_current(status) {
                    kernel.on_process_exit(pid);
                    kernel.exec.zombify_process(pid, status);
                }
            }
            Control::Halt => {
                // The machine latched during the resumption. The halting
                // thread's context stays occupied forever; there is no
                // path back to any caller.
                assert!(
                    kernel.machine.halted(),
                    "Control::Halt without the halt latch set"
                );
                kernel.exec.store_entry(tid, task);
            }
        }
    }
}
