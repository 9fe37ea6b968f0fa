//! # Execution Contexts
//!
//! A context is the saved machine state of one flow of control: a stack,
//! an address space, and a lifecycle position. The switch engine is the
//! primitive every other piece of concurrency is built from: it moves the
//! "active" marker between contexts and refuses to see two occupants at
//! once.
//!
//! Switching is asymmetric: the point a context is switched in at is not
//! the point its predecessor was switched out at. In this model the entry
//! code lives in the owning thread's task, so the asymmetry shows up as
//! state transitions rather than a stack pivot.

use crate::Tid;
use log::trace;
use mica_hal::mem::{AddressSpaceId, KernelStack};

/// Lifecycle position of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Built but never activated
    Fresh,
    /// Currently executing on the CPU
    Active,
    /// Switched out; may be activated again
    Suspended,
    /// Permanently done; activation is a fatal error
    Retired,
}

/// Which flow of control a context belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOwner {
    /// The one-shot bootstrap context; has no owning thread
    Bootstrap,
    /// A thread's context
    Thread(Tid),
}

/// Saved machine state sufficient to resume a flow of control
#[derive(Debug)]
pub struct ExecutionContext {
    stack: KernelStack,
    space: AddressSpaceId,
    state: ContextState,
}

impl ExecutionContext {
    /// Prepare a context on the given stack and address space
    pub fn new(stack: KernelStack, space: AddressSpaceId) -> Self {
        Self {
            stack,
            space,
            state: ContextState::Fresh,
        }
    }

    /// Current lifecycle position
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// The stack this context executes on
    pub fn stack(&self) -> &KernelStack {
        &self.stack
    }

    /// The address space this context executes in
    pub fn space(&self) -> AddressSpaceId {
        self.space
    }

    fn set_state(&mut self, state: ContextState) {
        self.state = state;
    }
}

/// The context switch primitive
///
/// Tracks the single active context and the total number of switches.
/// Violations of the single-active invariant are bootstrap-ordering bugs
/// and fail hard.
pub struct SwitchEngine {
    active: Option<ContextOwner>,
    switches: u64,
}

impl SwitchEngine {
    /// Create the engine; no context is active yet
    pub const fn new() -> Self {
        Self {
            active: None,
            switches: 0,
        }
    }

    /// Switch a context in
    ///
    /// The previous occupant must already have been suspended or retired.
    pub fn activate(&mut self, owner: ContextOwner, ctx: &mut ExecutionContext) {
        assert!(
            self.active.is_none(),
            "context {:?} activated while {:?} still occupies the cpu",
            owner,
            self.active
        );
        assert!(
            ctx.state() != ContextState::Retired,
            "retired context {:?} activated",
            owner
        );
        ctx.set_state(ContextState::Active);
        self.active = Some(owner);
        self.switches += 1;
        trace!("switch: {:?} active (switch #{})", owner, self.switches);
    }

    /// Switch the active context out, keeping it resumable
    pub fn suspend(&mut self, owner: ContextOwner, ctx: &mut ExecutionContext) {
        assert_eq!(
            self.active,
            Some(owner),
            "suspend of a context that is not active"
        );
        ctx.set_state(ContextState::Suspended);
        self.active = None;
    }

    /// Switch the active context out permanently
    ///
    /// Used for the bootstrap context after its one-way jump and for
    /// threads that have exited.
    pub fn retire(&mut self, owner: ContextOwner, ctx: &mut ExecutionContext) {
        assert_eq!(
            self.active,
            Some(owner),
            "retire of a context that is not active"
        );
        ctx.set_state(ContextState::Retired);
        self.active = None;
        trace!("switch: {:?} retired", owner);
    }

    /// The context currently on the CPU, if any
    pub fn active(&self) -> Option<ContextOwner> {
        self.active
    }

    /// Total number of switch-ins so far
    pub fn switches(&self) -> u64 {
        self.switches
    }
}

impl Default for SwitchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_hal::mem::FrameAllocator;

    fn ctx(frames: &mut FrameAllocator) -> ExecutionContext {
        let stack = KernelStack::allocate(frames).unwrap();
        ExecutionContext::new(stack, AddressSpaceId::KERNEL)
    }

    #[test]
    fn activate_suspend_roundtrip() {
        let mut frames = FrameAllocator::default();
        let mut engine = SwitchEngine::new();
        let mut a = ctx(&mut frames);

        engine.activate(ContextOwner::Bootstrap, &mut a);
        assert_eq!(engine.active(), Some(ContextOwner::Bootstrap));
        assert_eq!(a.state(), ContextState::Active);

        engine.suspend(ContextOwner::Bootstrap, &mut a);
        assert_eq!(engine.active(), None);
        assert_eq!(a.state(), ContextState::Suspended);
        assert_eq!(engine.switches(), 1);
    }

    #[test]
    #[should_panic(expected = "still occupies the cpu")]
    fn two_active_contexts_panic() {
        let mut frames = FrameAllocator::default();
        let mut engine = SwitchEngine::new();
        let mut a = ctx(&mut frames);
        let mut b = ctx(&mut frames);

        engine.activate(ContextOwner::Bootstrap, &mut a);
        engine.activate(ContextOwner::Thread(crate::Tid::new(0)), &mut b);
    }

    #[test]
    #[should_panic(expected = "retired context")]
    fn retired_context_stays_down() {
        let mut frames = FrameAllocator::default();
        let mut engine = SwitchEngine::new();
        let mut a = ctx(&mut frames);

        engine.activate(ContextOwner::Bootstrap, &mut a);
        engine.retire(ContextOwner::Bootstrap, &mut a);
        engine.activate(ContextOwner::Bootstrap, &mut a);
    }
}
