//=========================================================================
// Core
//=========================================================================
//
// Everything that runs independently of the windowing backend.
//
// Architecture:
//   node             → Node, Visual, DrawingContext, NodeContext, NodeId
//   tree             → SceneTree (arena, logic pass, render pass)
//   timer / tween    → one-shot timers and tweens owned by the tree
//   input            → InputEvent, StateTracker
//   scheduler        → TickClock, Lifecycle, SceneHandle, LogicLoop
//   platform_bridge  → messages between presentation and logic threads
//   error            → TreeError, SceneError, EngineError
//
// The platform layer (winit) sits outside `core` and is private to the
// crate; applications only see it through `Engine` and `Renderer`.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod error;
pub mod input;
pub mod node;
pub mod platform_bridge;
pub mod scheduler;
pub mod timer;
pub mod tree;
pub mod tween;

//=== Public API ==========================================================

pub use error::{EngineError, HookError, HookResult, SceneError, TreeError};
pub use node::{DrawingContext, HookPhase, Node, NodeContext, NodeId, ProcessMode, Visual};
pub use scheduler::{AppState, FailurePolicy, Lifecycle, SceneHandle, TickClock};
pub use timer::{TimerHandle, TimerId};
pub use tree::SceneTree;
pub use tween::{Easing, Tween, TweenId};
