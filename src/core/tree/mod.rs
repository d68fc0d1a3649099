//=========================================================================
// Scene Tree
//=========================================================================
//
// Owner of every node, timer and tween, plus the pause flag and the
// readiness record.
//
// Architecture:
//   SceneTree
//     ├─ arena: NodeArena          (all nodes, attached or detached)
//     ├─ root: Option<NodeId>      (entry point of both passes)
//     ├─ ready: HashSet<NodeId>    (nodes whose ready hook fired)
//     ├─ timers: Vec<Timer>
//     ├─ tweens: Vec<Tween>
//     └─ input: StateTracker       (edge state for the current tick)
//
// Passes:
//   process(delta)  → process.rs  (logic tick)
//   render(ctx)     → render.rs   (paint)
//
// Structural invariant: strict forest. `add_child` rejects attaching a node
// that already has a parent, the root, or an ancestor of the target parent.
//
//=========================================================================

//=== Module Declarations =================================================

mod process;
mod render;

//=== External Dependencies ===============================================

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::error::{HookResult, TreeError};
use crate::core::input::StateTracker;
use crate::core::node::{Node, NodeArena, NodeId, NodeSlot, ProcessMode};
use crate::core::timer::{Timer, TimerHandle, TimerId};
use crate::core::tween::{Tween, TweenId};

//=== SceneTree ===========================================================

/// The scene graph and everything scheduled against it.
///
/// A tree is driven by two passes: [`SceneTree::process`] once per logic
/// tick and [`SceneTree::render`] once per paint. Both are synchronous and
/// run to completion; callers share a tree between threads through
/// [`SceneHandle`](crate::core::scheduler::SceneHandle).
pub struct SceneTree {
    arena: NodeArena,
    root: Option<NodeId>,
    paused: bool,
    ready: HashSet<NodeId>,

    //--- Tick State -------------------------------------------------------
    delta: Duration,
    tick: u64,
    input: StateTracker,

    //--- Timers -----------------------------------------------------------
    timers: Vec<Timer>,
    next_timer_id: u64,
    advancing_timers: bool,
    /// Timers taken out of `timers` by the running advancement.
    in_flight_timers: HashSet<TimerId>,
    cancelled_timers: Vec<TimerId>,

    //--- Tweens -----------------------------------------------------------
    tweens: Vec<Tween>,
    next_tween_id: u64,
    advancing_tweens: bool,
    in_flight_tweens: HashSet<TweenId>,
    killed_tweens: Vec<TweenId>,
}

impl SceneTree {
    /// Creates an empty, unpaused tree without a root.
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            paused: false,
            ready: HashSet::new(),
            delta: Duration::ZERO,
            tick: 0,
            input: StateTracker::new(),
            timers: Vec::new(),
            next_timer_id: 1,
            advancing_timers: false,
            in_flight_timers: HashSet::new(),
            cancelled_timers: Vec::new(),
            tweens: Vec::new(),
            next_tween_id: 1,
            advancing_tweens: false,
            in_flight_tweens: HashSet::new(),
            killed_tweens: Vec::new(),
        }
    }

    //=====================================================================
    // Structure
    //=====================================================================

    /// Stores a detached node and returns its handle.
    pub fn insert<N: Node>(&mut self, name: &str, node: N) -> NodeId {
        self.insert_boxed(name, Box::new(node))
    }

    /// Stores an already boxed node.
    pub fn insert_boxed(&mut self, name: &str, node: Box<dyn Node>) -> NodeId {
        let id = self.arena.insert(NodeSlot::new(name.to_string(), node));
        debug!(target: "scene", "Inserted node '{}' as {}", name, id);
        id
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// A child attached while a process pass is running is first visited
    /// on the next tick, unless a children snapshot of this tick already
    /// holds it (re-attaching a captured node keeps its visit).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.arena.contains(parent) {
            return Err(TreeError::StaleNode(parent));
        }
        let current_parent = self
            .arena
            .get(child)
            .ok_or(TreeError::StaleNode(child))?
            .parent;

        if let Some(existing) = current_parent {
            return Err(TreeError::AlreadyAttached { child, parent: existing });
        }
        if self.root == Some(child) {
            return Err(TreeError::IsRoot(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle { child, parent });
        }

        let tick = self.tick;
        if let Some(slot) = self.arena.get_mut(child) {
            slot.parent = Some(parent);
            if slot.snapshot_tick != tick {
                slot.attached_tick = tick;
            }
        }
        if let Some(slot) = self.arena.get_mut(parent) {
            slot.children.push(child);
        }

        debug!(target: "scene", "Attached {} under {}", child, parent);
        Ok(())
    }

    /// Detaches `child` from `parent`. The node stays alive and detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.arena.contains(parent) {
            return Err(TreeError::StaleNode(parent));
        }
        let slot = self.arena.get(child).ok_or(TreeError::StaleNode(child))?;
        if slot.parent != Some(parent) {
            return Err(TreeError::NotAChild { child, parent });
        }

        self.detach(child);
        debug!(target: "scene", "Detached {} from {}", child, parent);
        Ok(())
    }

    /// Frees `id` and its whole subtree, children before parents.
    ///
    /// Teardown hooks run before this returns (for a node whose hook is
    /// currently running, as soon as that hook returns). Readiness records
    /// of the freed nodes are dropped. Returns `false` for a stale handle.
    pub fn free(&mut self, id: NodeId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }

        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }

        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        for node in &order {
            self.release(*node);
        }

        debug!(target: "scene", "Freed {} ({} nodes)", id, order.len());
        true
    }

    /// Makes a live, detached node the root. The previous root stays alive.
    pub fn set_root(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.validate_new_root(id)?;
        self.root = Some(id);
        debug!(target: "scene", "Root set to {}", id);
        Ok(())
    }

    /// Replaces the scene.
    ///
    /// Frees the current root's subtree, installs `new_root` and clears the
    /// whole readiness record, so every node of the new scene runs its ready
    /// hook again. `new_root` is validated before anything is freed.
    /// Passing the current root frees nothing and only resets readiness.
    pub fn change_scene(&mut self, new_root: NodeId) -> Result<(), TreeError> {
        self.validate_new_root(new_root)?;

        if let Some(old) = self.root.take() {
            if old != new_root {
                self.free(old);
            }
        }
        self.root = Some(new_root);
        self.ready.clear();

        info!(target: "scene", "Scene changed, new root {}", new_root);
        Ok(())
    }

    /// Enables or disables a node and its subtree for both passes.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<(), TreeError> {
        let slot = self.arena.get_mut(id).ok_or(TreeError::StaleNode(id))?;
        slot.active = active;
        Ok(())
    }

    /// Sets a node's own process mode.
    pub fn set_process_mode(&mut self, id: NodeId, mode: ProcessMode) -> Result<(), TreeError> {
        let slot = self.arena.get_mut(id).ok_or(TreeError::StaleNode(id))?;
        slot.process_mode = mode;
        Ok(())
    }

    //=====================================================================
    // Queries
    //=====================================================================

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|slot| slot.name.as_str())
    }

    /// `false` for inactive or stale nodes.
    pub fn is_active(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|slot| slot.active)
    }

    pub fn process_mode(&self, id: NodeId) -> Option<ProcessMode> {
        self.arena.get(id).map(|slot| slot.process_mode)
    }

    /// Nearest non-`Inherit` mode walking from `id` up through its parents,
    /// or [`ProcessMode::FALLBACK`] if none declares one. `None` for a
    /// stale handle.
    pub fn effective_mode(&self, id: NodeId) -> Option<ProcessMode> {
        let mut slot = self.arena.get(id)?;
        loop {
            if !slot.process_mode.is_inherit() {
                return Some(slot.process_mode);
            }
            match slot.parent.and_then(|parent| self.arena.get(parent)) {
                Some(parent) => slot = parent,
                None => return Some(ProcessMode::FALLBACK),
            }
        }
    }

    /// Children in insertion order (empty for a stale handle).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|slot| slot.parent)
    }

    /// First direct child of `parent` called `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// `true` once the node's ready hook succeeded in the current scene.
    pub fn is_ready(&self, id: NodeId) -> bool {
        self.ready.contains(&id)
    }

    /// Borrows a node's behaviour as its concrete type.
    ///
    /// Returns `None` for stale handles, type mismatches, and for the node
    /// whose hook is currently running.
    pub fn node_ref<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.arena
            .get(id)?
            .behavior
            .as_deref()?
            .downcast_ref::<T>()
    }

    /// Mutable variant of [`SceneTree::node_ref`].
    pub fn node_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        self.arena
            .get_mut(id)?
            .behavior
            .as_deref_mut()?
            .downcast_mut::<T>()
    }

    //=====================================================================
    // Pause, Time & Input
    //=====================================================================

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(target: "scene", "Paused: {}", paused);
        }
        self.paused = paused;
    }

    /// Elapsed time of the current tick, written once before any hook runs.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Number of process passes run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn input(&self) -> &StateTracker {
        &self.input
    }

    pub(crate) fn input_mut(&mut self) -> &mut StateTracker {
        &mut self.input
    }

    //=====================================================================
    // Timers
    //=====================================================================

    /// Starts a one-shot timer. Poll the handle with [`TimerHandle::has_fired`].
    pub fn create_timer(&mut self, duration: Duration) -> TimerHandle {
        self.push_timer(duration, None)
    }

    /// Starts a one-shot timer that runs `on_timeout` when it fires.
    pub fn create_timer_with<F>(&mut self, duration: Duration, on_timeout: F) -> TimerHandle
    where
        F: FnOnce(&mut SceneTree) -> HookResult + Send + 'static,
    {
        self.push_timer(duration, Some(Box::new(on_timeout)))
    }

    /// Cancels a timer; it never fires.
    ///
    /// Returns `false` if the timer is unknown. While timers are being
    /// advanced, a timer still waiting in the pass has its cancellation
    /// recorded and applied before it would run.
    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        if let Some(pos) = self.timers.iter().position(|t| t.id() == id) {
            let mut timer = self.timers.remove(pos);
            timer.cancel();
            debug!(target: "scene", "Removed {}", id);
            return true;
        }
        if self.advancing_timers && self.in_flight_timers.contains(&id) {
            if !self.cancelled_timers.contains(&id) {
                self.cancelled_timers.push(id);
            }
            return true;
        }
        false
    }

    /// Number of live timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Time left on a live timer.
    pub fn timer_remaining(&self, id: TimerId) -> Option<Duration> {
        self.timers.iter().find(|t| t.id() == id).map(Timer::remaining)
    }

    fn push_timer(
        &mut self,
        duration: Duration,
        on_timeout: Option<crate::core::timer::TimeoutCallback>,
    ) -> TimerHandle {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;

        let timer = Timer::new(id, duration, on_timeout, self.tick);
        let handle = timer.handle();
        self.timers.push(timer);

        debug!(target: "scene", "Created {} ({:?})", id, duration);
        handle
    }

    //=====================================================================
    // Tweens
    //=====================================================================

    /// Creates a tween bound to `owner` and returns it for step chaining.
    ///
    /// With [`ProcessMode::Inherit`] the tween follows its owner's effective
    /// mode. A tween whose owner is freed is killed at its next advancement.
    pub fn create_tween(&mut self, owner: NodeId, mode: ProcessMode) -> &mut Tween {
        if !self.arena.contains(owner) {
            warn!(target: "scene", "Tween created for stale owner {}", owner);
        }

        let id = TweenId(self.next_tween_id);
        self.next_tween_id += 1;
        debug!(target: "scene", "Created {} for {} ({:?})", id, owner, mode);

        self.tweens.push(Tween::new(id, owner, mode, self.tick));
        let last = self.tweens.len() - 1;
        &mut self.tweens[last]
    }

    /// Stops a tween. Returns `false` if the tween is unknown.
    pub fn kill_tween(&mut self, id: TweenId) -> bool {
        if let Some(tween) = self.tweens.iter_mut().find(|t| t.id() == id) {
            tween.kill();
            return true;
        }
        if self.advancing_tweens && self.in_flight_tweens.contains(&id) {
            if !self.killed_tweens.contains(&id) {
                self.killed_tweens.push(id);
            }
            return true;
        }
        false
    }

    /// Looks up a live tween.
    pub fn tween(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.iter().find(|t| t.id() == id)
    }

    /// Number of live tweens.
    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    //=====================================================================
    // Internal Helpers
    //=====================================================================

    fn validate_new_root(&self, id: NodeId) -> Result<(), TreeError> {
        let slot = self.arena.get(id).ok_or(TreeError::StaleNode(id))?;
        if slot.parent.is_some() {
            return Err(TreeError::RootNotDetached(id));
        }
        Ok(())
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.arena.get_mut(id).and_then(|slot| slot.parent.take()) else {
            return;
        };
        if let Some(slot) = self.arena.get_mut(parent) {
            slot.children.retain(|child| *child != id);
        }
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(slot) = self.arena.get(id) {
            for child in &slot.children {
                self.collect_post_order(*child, out);
            }
            out.push(id);
        }
    }

    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.arena.remove(id) else {
            return;
        };
        self.ready.remove(&id);
        // A behaviour lent to a running hook is torn down when it is returned.
        if let Some(mut behavior) = slot.behavior {
            behavior.on_free();
        }
    }
}

//--- Trait Implementations -----------------------------------------------

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
