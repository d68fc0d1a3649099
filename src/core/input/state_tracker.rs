//=========================================================================
// State Tracker
//=========================================================================
//
// Input edge state for one logic tick.
//
// Architecture:
//   batches (from presentation) → advance() → held sets + per-tick edges
//
// Per-tick lifecycle: clear() → process_events() → finalize_frame()
// The logic loop runs it under the scene lock, right before
// `SceneTree::process`, so every hook of a tick sees the same edges.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

//=== Internal Dependencies ===============================================

use super::event::{InputEvent, KeyCode, Modifiers, MouseButton};

//=== StateTracker ========================================================

/// Held state plus what changed during the current tick.
#[derive(Debug, Default)]
pub struct StateTracker {
    //--- Held (persists across ticks) -------------------------------------
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: (f32, f32),
    modifiers: Modifiers,

    //--- Edges (reset every tick) -----------------------------------------
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    wheel_delta: f32,

    //--- Derived ----------------------------------------------------------
    previous_position: (f32, f32),
    mouse_delta: (f32, f32),
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Tick Processing --------------------------------------------------

    /// Runs a full tick update over the batches delivered since the last tick.
    pub(crate) fn advance(&mut self, batches: &[Vec<InputEvent>]) {
        self.clear();
        for batch in batches {
            self.process_events(batch);
        }
        self.finalize_frame();
    }

    /// Drops last tick's edges.
    pub(crate) fn clear(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.wheel_delta = 0.0;
        self.previous_position = self.mouse_position;
    }

    pub(crate) fn process_events(&mut self, events: &[InputEvent]) {
        for event in events {
            self.process_event(event);
        }
    }

    /// Derives per-tick values once all events were applied.
    pub(crate) fn finalize_frame(&mut self) {
        self.mouse_delta = (
            self.mouse_position.0 - self.previous_position.0,
            self.mouse_position.1 - self.previous_position.1,
        );
    }

    fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                self.modifiers = *modifiers;
                // OS key repeat re-sends KeyDown; only the first is an edge.
                if self.keys_down.insert(*key) {
                    self.keys_pressed.insert(*key);
                }
            }
            InputEvent::KeyUp { key, modifiers } => {
                self.modifiers = *modifiers;
                if self.keys_down.remove(key) {
                    self.keys_released.insert(*key);
                }
            }
            InputEvent::MouseButtonDown { button, modifiers } => {
                self.modifiers = *modifiers;
                if self.buttons_down.insert(*button) {
                    self.buttons_pressed.insert(*button);
                }
            }
            InputEvent::MouseButtonUp { button, modifiers } => {
                self.modifiers = *modifiers;
                if self.buttons_down.remove(button) {
                    self.buttons_released.insert(*button);
                }
            }
            InputEvent::MouseMoved { x, y } => self.mouse_position = (*x, *y),
            InputEvent::MouseWheel { delta } => self.wheel_delta += delta,
            InputEvent::Unidentified => {}
        }
    }

    //=====================================================================
    // Keyboard
    //=====================================================================

    /// `true` only in the tick the key went down.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// `true` while the key is held.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// `true` only in the tick the key went up.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn keys_down(&self) -> impl Iterator<Item = &KeyCode> {
        self.keys_down.iter()
    }

    //=====================================================================
    // Mouse
    //=====================================================================

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn is_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Cursor movement since the previous tick.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Wheel notches scrolled during this tick (0 if none).
    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }

    //=====================================================================
    // Modifiers
    //=====================================================================

    /// Modifier state of the most recent discrete event.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
