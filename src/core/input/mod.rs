//=========================================================================
// Input
//=========================================================================
//
// Input edge state consumed by node hooks.
//
// Architecture:
//   event          → InputEvent, KeyCode, MouseButton, Modifiers
//   state_tracker  → StateTracker (held keys/buttons + per-tick edges)
//
// Events are produced on the presentation thread and applied on the logic
// thread; hooks read the result through `NodeContext::input()`.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod event;
mod state_tracker;

//=== Public API ==========================================================

pub use event::{InputEvent, KeyCode, Modifiers, MouseButton};
pub use state_tracker::StateTracker;
