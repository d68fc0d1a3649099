//=========================================================================
// Application Lifecycle
//=========================================================================
//
// Shared application state machine.
//
//   NotStarted → Running → ShuttingDown → Stopped
//
// Transitions only move forward. Either thread may request shutdown; the
// other observes it at the top of its loop.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use log::info;

//=== AppState ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum AppState {
    NotStarted = 0,
    Running = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl AppState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::Running,
            2 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }
}

//=== Lifecycle ===========================================================

/// Cloneable handle to the shared [`AppState`].
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: Arc<AtomicU8>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(AppState::NotStarted as u8)),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == AppState::Running
    }

    /// `NotStarted → Running`. Returns `false` if already started.
    pub fn start(&self) -> bool {
        self.advance_from(AppState::NotStarted, AppState::Running)
    }

    /// Moves to `ShuttingDown` unless already there or beyond.
    ///
    /// Returns `true` for the call that initiated the shutdown.
    pub fn request_shutdown(&self) -> bool {
        let initiated = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < AppState::ShuttingDown as u8).then_some(AppState::ShuttingDown as u8)
            })
            .is_ok();
        if initiated {
            info!(target: "scheduler", "Shutdown requested");
        }
        initiated
    }

    /// Terminal transition, once both threads have exited.
    pub fn mark_stopped(&self) {
        self.state.store(AppState::Stopped as u8, Ordering::Release);
        info!(target: "scheduler", "Stopped");
    }

    fn advance_from(&self, from: AppState, to: AppState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_forward_through_states() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), AppState::NotStarted);

        assert!(lifecycle.start());
        assert!(lifecycle.is_running());
        assert!(!lifecycle.start(), "Start happens once");

        assert!(lifecycle.request_shutdown());
        assert_eq!(lifecycle.state(), AppState::ShuttingDown);

        lifecycle.mark_stopped();
        assert_eq!(lifecycle.state(), AppState::Stopped);
    }

    #[test]
    fn only_first_shutdown_request_initiates() {
        let lifecycle = Lifecycle::new();
        lifecycle.start();
        let other_side = lifecycle.clone();

        assert!(other_side.request_shutdown());
        assert!(!lifecycle.request_shutdown());
        assert!(!lifecycle.is_running(), "Clones share state");
    }

    #[test]
    fn shutdown_never_moves_backwards() {
        let lifecycle = Lifecycle::new();
        lifecycle.mark_stopped();
        assert!(!lifecycle.request_shutdown());
        assert_eq!(lifecycle.state(), AppState::Stopped);
    }
}
