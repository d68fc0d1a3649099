//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_scene::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine
pub use crate::config::AppConfig;
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::platform::{NullRenderer, Renderer};

// Scene model
pub use crate::core::node::{DrawingContext, Node, NodeContext, NodeId, ProcessMode, Visual};
pub use crate::core::tree::SceneTree;

// Timers and tweens
pub use crate::core::timer::{TimerHandle, TimerId};
pub use crate::core::tween::{Easing, TweenId};

// Input
pub use crate::core::input::{InputEvent, KeyCode, Modifiers, MouseButton, StateTracker};

// Scheduling
pub use crate::core::scheduler::{AppState, FailurePolicy, SceneHandle};

// Errors
pub use crate::core::error::{EngineError, HookError, HookResult, SceneError, TreeError};
