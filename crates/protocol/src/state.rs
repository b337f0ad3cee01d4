//! Component lifecycle states
//!
//! Every long-lived component (source, writer, router, engine) carries a
//! [`RunStateCell`] and follows the same transition graph:
//!
//! ```text
//! Created ──────────────┐
//! FailedInitialization ─┴→ Transitioning → Initialized | FailedInitialization
//! Initialized | Stopped | Failed → Transitioning → Running | Failed
//! Running → Transitioning → Stopped | Failed
//! ```
//!
//! `Transitioning` is never observed by a quiescent reader - it marks a
//! transition in progress and blocks any other transition from starting.

use std::sync::atomic::{AtomicU8, Ordering};

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// Lifecycle state of a long-lived component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    /// Constructed, not yet initialized
    Created = 0,
    /// Initialization completed, ready to start
    Initialized = 1,
    /// Actively processing
    Running = 2,
    /// Stopped cleanly, may be restarted
    Stopped = 3,
    /// Failed while running; the supervisor may restart it
    Failed = 4,
    /// Initialization failed; initialize may be retried
    FailedInitialization = 5,
    /// A transition is in progress; no other transition may begin
    Transitioning = 6,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunState::Created,
            1 => RunState::Initialized,
            2 => RunState::Running,
            3 => RunState::Stopped,
            4 => RunState::Failed,
            5 => RunState::FailedInitialization,
            _ => RunState::Transitioning,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Created => "created",
            RunState::Initialized => "initialized",
            RunState::Running => "running",
            RunState::Stopped => "stopped",
            RunState::Failed => "failed",
            RunState::FailedInitialization => "failed_initialization",
            RunState::Transitioning => "transitioning",
        };
        f.write_str(s)
    }
}

/// Lock-free storage for a component's [`RunState`].
///
/// The first action of any transition is a CAS into `Transitioning`; the last
/// action stores the terminal state. Because only a caller that won the CAS
/// may store a terminal state, transitions never interleave and readers never
/// take a lock.
#[derive(Debug)]
pub struct RunStateCell(AtomicU8);

impl RunStateCell {
    /// Create a cell in the `Created` state
    pub const fn new() -> Self {
        Self(AtomicU8::new(RunState::Created as u8))
    }

    /// Read the current state
    #[inline]
    pub fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Begin a transition if the current state is one of `from`.
    ///
    /// On success the state is `Transitioning` and the caller owns the
    /// transition; it must finish with [`complete`](Self::complete). Returns
    /// `false` when the current state is not eligible (including when another
    /// transition is already in progress).
    pub fn begin_transition(&self, from: &[RunState]) -> bool {
        loop {
            let cur = self.0.load(Ordering::Acquire);
            if !from.iter().any(|s| *s as u8 == cur) {
                return false;
            }
            if self
                .0
                .compare_exchange(
                    cur,
                    RunState::Transitioning as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Finish a transition started with [`begin_transition`](Self::begin_transition)
    #[inline]
    pub fn complete(&self, to: RunState) {
        self.0.store(to as u8, Ordering::Release);
    }

    /// Self-initiated failure signal (the `set_failed` path).
    ///
    /// Unlike a transition this is a direct store: a component that can no
    /// longer continue flags itself `Failed` without negotiating, and the
    /// supervisor picks it up from there.
    #[inline]
    pub fn set_failed(&self) {
        self.0.store(RunState::Failed as u8, Ordering::Release);
    }

    /// True while the component is `Running`
    #[inline]
    pub fn is_running(&self) -> bool {
        self.get() == RunState::Running
    }

    /// True once a past `initialize` succeeded.
    ///
    /// Used to make repeated `initialize` calls idempotent: any state other
    /// than `Created`, `FailedInitialization`, or `Transitioning` implies a
    /// successful initialization happened.
    #[inline]
    pub fn initialized(&self) -> bool {
        !matches!(
            self.get(),
            RunState::Created | RunState::FailedInitialization | RunState::Transitioning
        )
    }
}

impl Default for RunStateCell {
    fn default() -> Self {
        Self::new()
    }
}
