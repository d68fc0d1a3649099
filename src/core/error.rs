//=========================================================================
// Error Types
//=========================================================================
//
// Error taxonomy for the scene runtime.
//
// Layers:
//   HookError   → raised by user hooks (boxed, opaque to the scheduler)
//   TreeError   → structural misuse of the node arena
//   SceneError  → anything a process/render pass can return
//   EngineError → anything the loop driver can return
//
// Clock anomalies are not errors: the scheduler clamps them.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::config::ConfigError;
use crate::core::node::{HookPhase, NodeId};
use crate::core::platform_bridge::PlatformError;
use crate::core::timer::TimerId;
use crate::core::tween::TweenId;

//=== Hook Errors =========================================================

/// Error type returned by node, timer and tween hooks.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?` or
/// `.into()`, including plain strings.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by every hook.
pub type HookResult = Result<(), HookError>;

//=== TreeError ===========================================================

/// Structural errors raised by arena and tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The handle refers to a node that was freed (or never existed).
    #[error("node {0} does not exist")]
    StaleNode(NodeId),

    /// The child already has a parent; detach it first.
    #[error("node {child} is already attached to {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCycle { child: NodeId, parent: NodeId },

    /// The node is not a direct child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { child: NodeId, parent: NodeId },

    /// The scene root cannot be attached under another node.
    #[error("node {0} is the scene root and cannot be attached")]
    IsRoot(NodeId),

    /// Only detached nodes can become the root.
    #[error("node {0} is attached to a parent and cannot become the root")]
    RootNotDetached(NodeId),
}

//=== SceneError ==========================================================

/// Errors surfaced by a process or render pass.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Structural misuse of the tree.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A node hook failed. The pass was aborted at this node.
    #[error("{phase} hook of node {node} failed: {source}")]
    Hook {
        node: NodeId,
        phase: HookPhase,
        #[source]
        source: HookError,
    },

    /// A timer completion callback failed.
    #[error("timeout callback of timer {timer} failed: {source}")]
    Timer {
        timer: TimerId,
        #[source]
        source: HookError,
    },

    /// A tween callback step failed.
    #[error("callback of tween {tween} failed: {source}")]
    Tween {
        tween: TweenId,
        #[source]
        source: HookError,
    },
}

//=== EngineError =========================================================

/// Errors surfaced by the engine runtime (both execution contexts).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A tick or paint failed and the failure policy terminated the app.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The platform event loop could not be created or failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A hook panicked while holding the scene lock.
    #[error("scene lock poisoned by a panicked hook")]
    Poisoned,

    /// The logic thread could not be spawned.
    #[error("failed to spawn logic thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The logic thread panicked.
    #[error("logic thread panicked")]
    LogicThreadPanicked,
}

//=========================================================================
// Unit Tests
//=========================================================================
