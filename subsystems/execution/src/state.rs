//! # Execution State
//!
//! `ExecState` bundles the process and thread arenas, the scheduler, and
//! the switch engine, and owns every lifecycle transition. One value of
//! this type exists per boot; ownership of arena slots moves explicitly
//! on create and destroy, and all mutation happens from the single active
//! context.

use crate::context::{ContextOwner, ExecutionContext};
use crate::context::SwitchEngine;
use crate::process::ProcessTable;
use crate::thread::{BlockReason, ThreadFlags, ThreadState, ThreadTable};
use crate::{ExecError, ExecResult, Pid, Tid};
use log::debug;
use mica_hal::mem::{AddressSpaceId, FrameAllocator, KernelStack};

/// Orphans of a process that exits before reaping them are handed to the
/// idle process, which sits in the wait protocol until shutdown.
const REPARENT_TARGET: Pid = Pid::IDLE;

/// The whole execution subsystem state for one boot
pub struct ExecState<T> {
    /// Process arena
    pub processes: ProcessTable,
    /// Thread arena
    pub threads: ThreadTable<T>,
    /// Scheduler handoff
    pub scheduler: crate::scheduler::Scheduler,
    /// Context switch engine
    pub switch: SwitchEngine,
    current: Option<Tid>,
}

impl<T> ExecState<T> {
    /// Create empty execution state
    pub fn new() -> Self {
        Self {
            processes: ProcessTable::new(),
            threads: ThreadTable::new(),
            scheduler: crate::scheduler::Scheduler::new(),
            switch: SwitchEngine::new(),
            current: None,
        }
    }

    /// The thread currently on the CPU, if any
    pub fn current(&self) -> Option<Tid> {
        self.current
    }

    /// The process owning the current thread, if any
    pub fn current_process(&self) -> Option<Pid> {
        let tid = self.current?;
        Some(
            self.threads
                .get(tid)
                .expect("current thread not live")
                .process(),
        )
    }

    /// Create a process, parented to the current process when one exists
    pub fn process_create(&mut self, label: &str) -> Pid {
        let parent = self.current_process();
        self.processes.create(label, parent)
    }

    /// Create a thread in `process`, allocating its stack and building
    /// its execution context
    ///
    /// The only failure is allocation exhaustion; during bootstrap the
    /// caller treats that as fatal, since no thread exists yet to retry.
    pub fn thread_create(
        &mut self,
        process: Pid,
        entry: T,
        flags: ThreadFlags,
        frames: &mut FrameAllocator,
        space: AddressSpaceId,
    ) -> ExecResult<Tid> {
        if self.processes.lookup(process).is_none() {
            return Err(ExecError::ProcessNotFound);
        }
        let stack = KernelStack::allocate(frames).map_err(|_| ExecError::OutOfMemory)?;
        let context = ExecutionContext::new(stack, space);
        let tid = self.threads.create(process, context, entry, flags);
        self.processes
            .lookup_mut(process)
            .expect("owning process vanished")
            .add_thread(tid);
        debug!("thread: created {:?} for {:?}", tid, process);
        Ok(tid)
    }

    /// Transition a thread from `Created`/`Blocked` to `Runnable` and
    /// admit it to the handoff
    ///
    /// Does not itself cause a switch.
    pub fn make_runnable(&mut self, tid: Tid) {
        let thread = self
            .threads
            .get_mut(tid)
            .unwrap_or_else(|| panic!("make_runnable of dead thread {:?}", tid));
        thread.set_state(ThreadState::Runnable);
        thread.set_block_reason(None);
        self.scheduler.admit(tid);
    }

    /// Hand the CPU to the next runnable thread
    ///
    /// Activates its context and marks it `Running`. Returns `None` when
    /// the runnable set is empty.
    pub fn schedule_next(&mut self) -> Option<Tid> {
        assert!(
            self.current.is_none(),
            "handoff while {:?} still runs",
            self.current
        );
        let tid = self.scheduler.next()?;
        let thread = self
            .threads
            .get_mut(tid)
            .expect("runnable thread not live");
        thread.set_state(ThreadState::Running);
        self.switch
            .activate(ContextOwner::Thread(tid), thread.context_mut());
        self.current = Some(tid);
        Some(tid)
    }

    /// The running thread yields; it stays eligible for the next handoff
    pub fn yield_current(&mut self) {
        let tid = self.current.take().expect("yield with no current thread");
        let thread = self.threads.get_mut(tid).expect("current thread not live");
        thread.set_state(ThreadState::Runnable);
        self.switch
            .suspend(ContextOwner::Thread(tid), thread.context_mut());
        self.scheduler.admit(tid);
    }

    /// The running thread blocks until the awaited event occurs
    pub fn block_current(&mut self, reason: BlockReason) {
        let tid = self.current.take().expect("block with no current thread");
        let thread = self.threads.get_mut(tid).expect("current thread not live");
        thread.set_state(ThreadState::Blocked);
        thread.set_block_reason(Some(reason));
        self.switch
            .suspend(ContextOwner::Thread(tid), thread.context_mut());
        debug!("thread: {:?} blocked on {:?}", tid, reason);
    }

    /// The running thread terminates
    ///
    /// Its context is retired; the record survives until reaped. Returns
    /// the owning PID when this was the process's last live thread, in
    /// which case the caller must release the process's resources and
    /// then call [`ExecState::zombify_process`].
    pub fn exit_current(&mut self, status: i32) -> Option<Pid> {
        let tid = self.current.take().expect("exit with no current thread");
        let thread = self.threads.get_mut(tid).expect("current thread not live");
        let pid = thread.process();
        self.switch
            .retire(ContextOwner::Thread(tid), thread.context_mut());
        thread.exit(status);
        debug!("thread: {:?} exited with status {}", tid, status);

        let owner = self.processes.lookup(pid).expect("owning process not live");
        let all_exited = owner.threads().iter().all(|&t| {
            self.threads
                .get(t)
                .map(|th| th.state().is_terminal())
                .unwrap_or(true)
        });
        all_exited.then_some(pid)
    }

    /// Turn a process whose threads have all exited into a zombie
    ///
    /// Records the exit status, reparents unreaped children to idle, and
    /// wakes any thread of the parent blocked in the wait protocol. The
    /// working-directory reference must already have been released.
    pub fn zombify_process(&mut self, pid: Pid, status: i32) {
        let proc = self.processes.lookup_mut(pid).expect("process not live");
        let orphans = proc.take_children();
        let parent = proc.parent();
        proc.zombify(status);

        if !orphans.is_empty() {
            assert!(pid != REPARENT_TARGET, "idle exited with live children");
            let mut orphan_zombie = false;
            for orphan in orphans {
                let child = self
                    .processes
                    .lookup_mut(orphan)
                    .expect("orphan not live");
                child.set_parent(REPARENT_TARGET);
                orphan_zombie |= child.state() == crate::process::ProcessState::Zombie;
                self.processes
                    .lookup_mut(REPARENT_TARGET)
                    .expect("reparent target not live")
                    .add_child(orphan);
                debug!("proc: {:?} reparented to {:?}", orphan, REPARENT_TARGET);
            }
            if orphan_zombie {
                self.wake_child_waiters(REPARENT_TARGET);
            }
        }

        if let Some(parent) = parent {
            self.wake_child_waiters(parent);
        }
    }

    /// Make every thread of `parent` blocked on a child exit runnable
    fn wake_child_waiters(&mut self, parent: Pid) {
        let Some(proc) = self.processes.lookup(parent) else {
            return;
        };
        let waiters: alloc::vec::Vec<Tid> = proc
            .threads()
            .iter()
            .copied()
            .filter(|&tid| {
                self.threads.get(tid).is_some_and(|t| {
                    t.state() == ThreadState::Blocked
                        && t.block_reason() == Some(BlockReason::Child)
                })
            })
            .collect();
        for tid in waiters {
            debug!("wait: waking {:?} of parent {:?}", tid, parent);
            self.make_runnable(tid);
        }
    }

    /// Take a thread's entry task out for a resumption
    pub fn take_entry(&mut self, tid: Tid) -> Option<T> {
        self.threads.get_mut(tid)?.take_entry()
    }

    /// Put a thread's entry task back after a resumption
    pub fn store_entry(&mut self, tid: Tid, entry: T) {
        self.threads
            .get_mut(tid)
            .expect("storing entry of dead thread")
            .store_entry(entry);
    }
}

impl<T> Default for ExecState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::{WaitPoll, WaitTarget};

    fn boot_pair(frames: &mut FrameAllocator) -> (ExecState<u32>, Tid, Tid) {
        let mut exec: ExecState<u32> = ExecState::new();
        let idle = exec.processes.create("idle", None);
        assert_eq!(idle, Pid::IDLE);
        let idle_thr = exec
            .thread_create(idle, 0, ThreadFlags::KERNEL | ThreadFlags::IDLE, frames, AddressSpaceId::KERNEL)
            .unwrap();
        exec.make_runnable(idle_thr);
        assert_eq!(exec.schedule_next(), Some(idle_thr));

        // created from idle's context, so parented to idle
        let init = exec.process_create("init");
        assert_eq!(init, Pid::INIT);
        let init_thr = exec
            .thread_create(init, 1, ThreadFlags::KERNEL | ThreadFlags::INIT, frames, AddressSpaceId::KERNEL)
            .unwrap();
        (exec, idle_thr, init_thr)
    }

    #[test]
    fn cooperative_handoff_wait_and_reap() {
        let mut frames = FrameAllocator::default();
        let (mut exec, idle_thr, init_thr) = boot_pair(&mut frames);

        exec.make_runnable(init_thr);
        // children exist but none is a zombie yet
        assert_eq!(exec.wait_poll(WaitTarget::Any), Ok(WaitPoll::WouldBlock));
        exec.block_current(BlockReason::Child);

        // init runs to completion
        assert_eq!(exec.schedule_next(), Some(init_thr));
        let zombied = exec.exit_current(0);
        assert_eq!(zombied, Some(Pid::INIT));
        exec.zombify_process(Pid::INIT, 0);

        // idle was woken by the exit
        assert_eq!(exec.schedule_next(), Some(idle_thr));
        assert_eq!(
            exec.wait_poll(WaitTarget::Any),
            Ok(WaitPoll::Reaped(Pid::INIT, 0))
        );
        // reap destroyed the records
        assert!(exec.processes.lookup(Pid::INIT).is_none());
        assert!(exec.threads.get(init_thr).is_none());
        // reap idempotence: nothing left to wait for
        assert_eq!(exec.wait_poll(WaitTarget::Any), Err(ExecError::NoChildren));
    }

    #[test]
    fn wait_with_no_children_fails_immediately() {
        let mut frames = FrameAllocator::default();
        let mut exec: ExecState<u32> = ExecState::new();
        let idle = exec.processes.create("idle", None);
        let thr = exec
            .thread_create(idle, 0, ThreadFlags::KERNEL, &mut frames, AddressSpaceId::KERNEL)
            .unwrap();
        exec.make_runnable(thr);
        exec.schedule_next();
        assert_eq!(exec.wait_poll(WaitTarget::Any), Err(ExecError::NoChildren));
    }

    #[test]
    fn wait_for_specific_child_ignores_other_zombies() {
        let mut frames = FrameAllocator::default();
        let (mut exec, _idle_thr, init_thr) = boot_pair(&mut frames);
        let other = exec.process_create("other");
        let other_thr = exec
            .thread_create(other, 2, ThreadFlags::KERNEL, &mut frames, AddressSpaceId::KERNEL)
            .unwrap();
        exec.make_runnable(init_thr);
        exec.make_runnable(other_thr);

        // a specific-pid wait must not consume another child's zombie
        exec.block_current(BlockReason::Child);
        assert_eq!(exec.schedule_next(), Some(init_thr));
        if let Some(pid) = exec.exit_current(3) {
            exec.zombify_process(pid, 3);
        }
        assert_eq!(exec.schedule_next(), Some(_idle_thr));
        assert_eq!(
            exec.wait_poll(WaitTarget::Child(other)),
            Ok(WaitPoll::WouldBlock)
        );
        assert_eq!(
            exec.wait_poll(WaitTarget::Child(Pid::INIT)),
            Ok(WaitPoll::Reaped(Pid::INIT, 3))
        );
    }

    #[test]
    fn orphans_are_reparented_to_idle() {
        let mut frames = FrameAllocator::default();
        let (mut exec, _idle_thr, init_thr) = boot_pair(&mut frames);
        exec.make_runnable(init_thr);
        exec.yield_current();
        assert_eq!(exec.schedule_next(), Some(init_thr));

        // init spawns a grandchild, then exits without reaping it
        let grandchild = exec.process_create("grandchild");
        let gc_thr = exec
            .thread_create(grandchild, 3, ThreadFlags::KERNEL, &mut frames, AddressSpaceId::KERNEL)
            .unwrap();
        exec.make_runnable(gc_thr);
        if let Some(pid) = exec.exit_current(0) {
            exec.zombify_process(pid, 0);
        }

        let gc = exec.processes.lookup(grandchild).unwrap();
        assert_eq!(gc.parent(), Some(Pid::IDLE));
        assert!(exec
            .processes
            .lookup(Pid::IDLE)
            .unwrap()
            .children()
            .contains(&grandchild));
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut frames = FrameAllocator::new(1);
        let mut exec: ExecState<u32> = ExecState::new();
        let idle = exec.processes.create("idle", None);
        assert_eq!(
            exec.thread_create(idle, 0, ThreadFlags::KERNEL, &mut frames, AddressSpaceId::KERNEL),
            Err(ExecError::OutOfMemory)
        );
    }
}
