//=========================================================================
// Node System
//=========================================================================
//
// Capability surface the scheduler consumes from scene nodes.
//
// Architecture:
//   SceneTree
//     └─ NodeArena
//          └─ NodeSlot { active, process_mode, parent, children, behavior }
//                                                              │
//                                           Box<dyn Node> ◄────┘
//
// The slot holds everything the scheduler decides on (activity, mode,
// structure). The boxed `Node` holds everything the application decides
// on (hooks, drawing, its own state).
//
// Hook order per tick (see `tree::process`):
//   ready (once) → process_begin → process → [children] → process_end
//
//=========================================================================

//=== Module Declarations =================================================

mod arena;
mod process_mode;

//=== Public API ==========================================================

pub use arena::NodeId;
pub use process_mode::ProcessMode;

pub(crate) use arena::{NodeArena, NodeSlot};

//=== External Dependencies ===============================================

use std::any::Any;
use std::fmt;
use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::core::error::{HookResult, TreeError};
use crate::core::input::StateTracker;
use crate::core::tree::SceneTree;

//=== HookPhase ===========================================================

/// Identifies which hook was running when a failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Ready,
    ProcessBegin,
    Process,
    ProcessEnd,
    Draw,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::ProcessBegin => "process_begin",
            Self::Process => "process",
            Self::ProcessEnd => "process_end",
            Self::Draw => "draw",
        };
        f.write_str(name)
    }
}

//=== Node Trait ==========================================================

/// Behaviour of a scene node.
///
/// Every hook has an empty default, so a node only overrides what it
/// needs. Hooks receive a [`NodeContext`] giving access to the whole tree
/// (to spawn children, create timers, toggle pause, ...).
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// struct Spinner { angle: f32 }
///
/// impl Node for Spinner {
///     fn process(&mut self, ctx: &mut NodeContext<'_>) -> HookResult {
///         self.angle += 90.0 * ctx.delta().as_secs_f32();
///         Ok(())
///     }
/// }
/// ```
pub trait Node: Any + Send {
    /// Called once, right before the node's first tick hook.
    fn ready(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called every tick the node runs, before [`Node::process`].
    fn process_begin(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// Main per-tick hook.
    fn process(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called after all children were visited in the same tick.
    fn process_end(&mut self, _ctx: &mut NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// Teardown hook, called when the node is freed.
    fn on_free(&mut self) {}

    /// Window nodes host an independently rendered surface. The outer
    /// render pass does not descend into them.
    fn is_window(&self) -> bool {
        false
    }

    /// Returns the drawing capability, if this node draws anything.
    fn as_visual_mut(&mut self) -> Option<&mut dyn Visual> {
        None
    }
}

impl dyn Node {
    /// Downcasts to a concrete node type.
    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Downcasts to a concrete node type.
    pub fn downcast_mut<T: Node>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

//=== Visual Trait ========================================================

/// Drawing capability of a node.
pub trait Visual {
    /// Hidden visuals are skipped by the render pass (their children are not).
    fn visible(&self) -> bool {
        true
    }

    /// Draws the node into the frame's drawing context.
    fn draw(&mut self, ctx: &mut dyn DrawingContext) -> HookResult;
}

//=== DrawingContext ======================================================

/// Opaque per-frame drawing handle supplied by the renderer.
///
/// Every `'static` type is a drawing context; draw hooks downcast to the
/// concrete type their renderer provides.
pub trait DrawingContext: Any {}

impl<T: Any> DrawingContext for T {}

impl dyn DrawingContext {
    /// Downcasts to the renderer's concrete context type.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

//=== NodeContext =========================================================

/// Access handed to a node's hooks.
///
/// While a hook runs, that node's behaviour is lent out of the tree, so
/// [`SceneTree::node_mut`] on the node's own id returns `None`. Everything
/// else (structure, other nodes, timers, tweens, pause) is reachable.
pub struct NodeContext<'a> {
    tree: &'a mut SceneTree,
    id: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(tree: &'a mut SceneTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Handle of the node whose hook is running.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Elapsed time of the current tick.
    pub fn delta(&self) -> Duration {
        self.tree.delta()
    }

    /// Input edge state for the current tick.
    pub fn input(&self) -> &StateTracker {
        self.tree.input()
    }

    /// Read access to the whole tree.
    pub fn tree(&self) -> &SceneTree {
        self.tree
    }

    /// Mutable access to the whole tree.
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        self.tree
    }

    /// Inserts `node` and attaches it as the last child of this node.
    ///
    /// The child is first processed on the next tick.
    pub fn add_child<N: Node>(&mut self, name: &str, node: N) -> Result<NodeId, TreeError> {
        let child = self.tree.insert(name, node);
        self.tree.add_child(self.id, child)?;
        Ok(child)
    }

    /// Frees this node and its subtree once the hook returns.
    pub fn free_self(&mut self) {
        self.tree.free(self.id);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
