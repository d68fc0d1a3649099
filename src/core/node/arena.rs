//=========================================================================
// Node Arena
//=========================================================================
//
// Slot storage for every node owned by a SceneTree.
//
// Architecture:
//   NodeId (index | generation << 32)
//      ↓
//   nodes[index]        → Option<NodeSlot>
//   generations[index]  → must equal NodeId::generation()
//
// Freeing a slot bumps its generation, so handles to a freed node never
// resolve again even after the index is reused. Readiness tracking and
// tween owners rely on this to avoid aliasing.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use super::process_mode::ProcessMode;
use super::Node;

//=== NodeId ==============================================================

/// Generational handle to a node in a [`SceneTree`](crate::core::SceneTree).
///
/// Low 32 bits hold the slot index, high 32 bits the slot generation.
/// Handles are `Copy` and never keep the node alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Builds a handle from its parts.
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self((index as u64) | ((generation as u64) << 32))
    }

    /// Slot index.
    #[inline]
    pub fn index(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Slot generation at the time the handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}:{})", self.index(), self.generation())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index(), self.generation())
    }
}

//=== NodeSlot ============================================================

/// Scheduler-owned state of one node.
///
/// `behavior` is `None` only while one of the node's own hooks is running
/// (the tree lends the behaviour out so the hook can borrow the tree).
pub(crate) struct NodeSlot {
    pub(crate) name: String,
    pub(crate) active: bool,
    pub(crate) process_mode: ProcessMode,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Tick counter value at the moment the node was attached to a parent.
    pub(crate) attached_tick: u64,
    /// Last tick in which a parent's children snapshot captured the node.
    pub(crate) snapshot_tick: u64,
    /// Last tick in which the process pass visited the node.
    pub(crate) visited_tick: u64,
    pub(crate) behavior: Option<Box<dyn Node>>,
}

impl NodeSlot {
    pub(crate) fn new(name: String, behavior: Box<dyn Node>) -> Self {
        Self {
            name,
            active: true,
            process_mode: ProcessMode::Inherit,
            parent: None,
            children: Vec::new(),
            attached_tick: 0,
            snapshot_tick: 0,
            visited_tick: 0,
            behavior: Some(behavior),
        }
    }
}

//=== NodeArena ===========================================================

/// Generational slot arena for [`NodeSlot`]s.
pub(crate) struct NodeArena {
    nodes: Vec<Option<NodeSlot>>,
    generations: Vec<u32>,
    free_indices: Vec<usize>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_indices: Vec::new(),
        }
    }

    /// Stores a slot and returns its handle, reusing freed indices first.
    pub(crate) fn insert(&mut self, slot: NodeSlot) -> NodeId {
        if let Some(index) = self.free_indices.pop() {
            self.nodes[index] = Some(slot);
            return NodeId::from_parts(index as u32, self.generations[index]);
        }

        let index = self.nodes.len();
        self.nodes.push(Some(slot));
        self.generations.push(0);
        NodeId::from_parts(index as u32, 0)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeSlot> {
        if !self.is_current(id) {
            return None;
        }
        self.nodes[id.index() as usize].as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        if !self.is_current(id) {
            return None;
        }
        self.nodes[id.index() as usize].as_mut()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Removes a slot and invalidates every handle to it.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeSlot> {
        if !self.is_current(id) {
            return None;
        }
        let index = id.index() as usize;
        let slot = self.nodes[index].take()?;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_indices.push(index);
        Some(slot)
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len() - self.free_indices.len()
    }

    fn is_current(&self, id: NodeId) -> bool {
        let index = id.index() as usize;
        index < self.nodes.len() && self.generations[index] == id.generation()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
