//=========================================================================
// Scene Timers
//=========================================================================
//
// One-shot countdowns owned by the SceneTree.
//
// Lifecycle:
//   create_timer() → active, counting down (only while unpaused)
//        ↓ remaining reaches zero
//   fired → callback runs once, handle reports has_fired()
//        ↓ end of the same advancement pass
//   dropped from the live set
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::core::error::HookResult;
use crate::core::tree::SceneTree;

//=== Types ===============================================================

/// One-shot completion callback of a timer.
pub type TimeoutCallback = Box<dyn FnOnce(&mut SceneTree) -> HookResult + Send>;

/// Identifier of a timer in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

//=== TimerHandle =========================================================

/// Caller-side view of a timer.
///
/// Cloneable and `Send`: the completion flag can be polled from any
/// node or thread. Cancel through [`SceneTree::remove_timer`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    fired: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Returns `true` once the timer reached zero.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

//=== Timer ===============================================================

pub(crate) struct Timer {
    id: TimerId,
    remaining: Duration,
    active: bool,
    fired: Arc<AtomicBool>,
    on_timeout: Option<TimeoutCallback>,
    /// Tick in which the timer was created; it is first advanced the tick after.
    created_tick: u64,
}

impl Timer {
    pub(crate) fn new(
        id: TimerId,
        duration: Duration,
        on_timeout: Option<TimeoutCallback>,
        created_tick: u64,
    ) -> Self {
        Self {
            id,
            remaining: duration,
            active: true,
            fired: Arc::new(AtomicBool::new(false)),
            on_timeout,
            created_tick,
        }
    }

    pub(crate) fn handle(&self) -> TimerHandle {
        TimerHandle {
            id: self.id,
            fired: Arc::clone(&self.fired),
        }
    }

    pub(crate) fn id(&self) -> TimerId {
        self.id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn created_tick(&self) -> u64 {
        self.created_tick
    }

    pub(crate) fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Counts down by `delta`. Returns `true` on the call that fires.
    pub(crate) fn advance(&mut self, delta: Duration) -> bool {
        if !self.active {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(delta);
        if !self.remaining.is_zero() {
            return false;
        }

        self.active = false;
        self.fired.store(true, Ordering::Release);
        true
    }

    /// Deactivates without firing.
    pub(crate) fn cancel(&mut self) {
        self.active = false;
        self.on_timeout = None;
    }

    pub(crate) fn take_callback(&mut self) -> Option<TimeoutCallback> {
        self.on_timeout.take()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
