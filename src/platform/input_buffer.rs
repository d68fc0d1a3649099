//=========================================================================
// Input Buffer
//
// Per-frame store of input collected on the presentation thread, flushed
// to the logic thread on every redraw.
//
// Two categories:
// - discrete: ordered one-shot events (keys, buttons); consecutive
//   duplicates (OS key repeat) are dropped
// - continuous: one entry per kind; cursor moves keep the latest
//   position, wheel events sum their deltas
//
// Draining keeps the allocated capacity for the next frame.
//=========================================================================

//=== Standard Library Imports ============================================
use std::collections::HashSet;

//=== Internal Modules ====================================================
use crate::core::input::InputEvent;

//=== InputBuffer Struct ==================================================

pub(crate) struct InputBuffer {
    discrete: Vec<InputEvent>,
    continuous: HashSet<InputEvent>,
}

impl InputBuffer {
    //--- Construction -----------------------------------------------------
    pub fn new() -> Self {
        const DISCRETE_BASE: usize = 128;
        const CONTINUOUS_BASE: usize = 4;

        Self {
            discrete: Vec::with_capacity(DISCRETE_BASE),
            continuous: HashSet::with_capacity(CONTINUOUS_BASE),
        }
    }

    //--- Continuous Event Handling ---------------------------------------
    //
    // `InputEvent` equality ignores continuous payloads, so the set holds
    // at most one event per kind.
    //
    pub fn push_continuous(&mut self, mut event: InputEvent) {
        if let InputEvent::MouseWheel { delta } = &mut event {
            let key = InputEvent::MouseWheel { delta: 0.0 };
            if let Some(InputEvent::MouseWheel { delta: pending }) = self.continuous.get(&key) {
                *delta += pending;
            }
        }
        self.continuous.replace(event);
    }

    //--- Discrete Event Handling -----------------------------------------
    pub fn push_discrete(&mut self, event: InputEvent) {
        if self.discrete.last() != Some(&event) {
            self.discrete.push(event);
        }
    }

    //--- Drain ------------------------------------------------------------
    //
    // Takes this frame's events as `(discrete, continuous)`, or `None`
    // when nothing was buffered.
    //
    pub fn drain(&mut self) -> Option<(Vec<InputEvent>, Vec<InputEvent>)> {
        if self.is_empty() {
            return None;
        }
        let discrete = self.discrete.drain(..).collect();
        let continuous = self.continuous.drain().collect();
        Some((discrete, continuous))
    }

    //--- Utilities --------------------------------------------------------
    pub fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.continuous.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
