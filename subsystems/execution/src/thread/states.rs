//! # Thread States
//!
//! Thread state machine definition.

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Constructed, not yet handed to the scheduler
    Created,
    /// Eligible for the next handoff
    Runnable,
    /// Currently executing; held by at most one thread system-wide
    Running,
    /// Waiting on another thread's progress
    Blocked,
    /// Terminal; identity and exit status survive until reaped
    Exited,
}

impl ThreadState {
    /// Check whether the thread can be admitted to the run queue
    pub fn can_run(&self) -> bool {
        matches!(self, ThreadState::Created | ThreadState::Blocked)
    }

    /// Check whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ThreadState::Exited)
    }

    /// Valid transitions from this state
    pub fn valid_transitions(&self) -> &[ThreadState] {
        match self {
            ThreadState::Created => &[ThreadState::Runnable],
            ThreadState::Runnable => &[ThreadState::Running],
            ThreadState::Running => &[
                ThreadState::Runnable,
                ThreadState::Blocked,
                ThreadState::Exited,
            ],
            ThreadState::Blocked => &[ThreadState::Runnable],
            ThreadState::Exited => &[],
        }
    }
}

impl Default for ThreadState {
    fn default() -> Self {
        ThreadState::Created
    }
}

/// Reason a thread is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Waiting for a child process to exit
    Child,
    /// Waiting for device I/O
    Io,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_is_terminal() {
        assert!(ThreadState::Exited.valid_transitions().is_empty());
        assert!(ThreadState::Exited.is_terminal());
    }

    #[test]
    fn running_is_not_admittable() {
        assert!(!ThreadState::Running.can_run());
        assert!(ThreadState::Blocked.can_run());
        assert!(ThreadState::Created.can_run());
    }
}
