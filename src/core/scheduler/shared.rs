//=========================================================================
// Shared Scene
//=========================================================================
//
// The single exclusion domain around the scene tree.
//
// Both threads hold a clone of `SceneHandle`:
//   logic thread        → lock → input edges + process(delta) → unlock
//   presentation thread → lock → render(frame)                → unlock
//
// A tick and a paint therefore never interleave. A lock poisoned by a
// panicking hook surfaces as `EngineError::Poisoned`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::{Arc, Mutex, MutexGuard};

//=== Internal Dependencies ===============================================

use crate::core::error::{EngineError, SceneError};
use crate::core::node::NodeId;
use crate::core::tree::SceneTree;

//=== SceneHandle =========================================================

/// Cloneable, thread-safe handle to the scene tree.
#[derive(Clone)]
pub struct SceneHandle {
    inner: Arc<Mutex<SceneTree>>,
}

impl SceneHandle {
    pub fn new(tree: SceneTree) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    /// Acquires the exclusion domain.
    pub fn lock(&self) -> Result<MutexGuard<'_, SceneTree>, EngineError> {
        self.inner.lock().map_err(|_| EngineError::Poisoned)
    }

    /// Runs `f` with exclusive access to the tree.
    pub fn with<R>(&self, f: impl FnOnce(&mut SceneTree) -> R) -> Result<R, EngineError> {
        let mut tree = self.lock()?;
        Ok(f(&mut tree))
    }

    /// Replaces the scene from outside any hook.
    ///
    /// Hooks already hold the lock and call [`SceneTree::change_scene`]
    /// directly.
    pub fn change_scene(&self, new_root: NodeId) -> Result<(), EngineError> {
        self.with(|tree| tree.change_scene(new_root))?
            .map_err(|err| EngineError::Scene(SceneError::Tree(err)))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
