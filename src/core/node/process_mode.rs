//=========================================================================
// Process Mode
//=========================================================================
//
// Per-node policy deciding whether a node runs while the tree is paused.
//
// Resolution:
//   node.mode != Inherit  → node.mode
//   else walk parents     → first non-Inherit ancestor
//   else                  → Pausable
//
// The walk itself lives on SceneTree (it needs the arena); this module
// only owns the enum and the should-process table.
//
//=========================================================================

//=== ProcessMode =========================================================

/// Controls whether a node (or tween) runs given the tree's pause flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessMode {
    /// Takes the mode of the nearest ancestor that declares one.
    #[default]
    Inherit,

    /// Runs regardless of pause state.
    Always,

    /// Runs only while the tree is not paused.
    Pausable,

    /// Runs only while the tree is paused (pause menus, overlays).
    WhenPaused,

    /// Never runs.
    Disabled,
}

impl ProcessMode {
    /// Mode used when no node in the ancestor chain declares one.
    pub const FALLBACK: Self = Self::Pausable;

    /// Returns `true` if this mode runs under the given pause state.
    ///
    /// `Inherit` should be resolved before calling this; if it is not,
    /// it behaves like [`ProcessMode::FALLBACK`].
    pub fn should_process(self, paused: bool) -> bool {
        match self {
            Self::Disabled => false,
            Self::Always => true,
            Self::Pausable | Self::Inherit => !paused,
            Self::WhenPaused => paused,
        }
    }

    /// Returns `true` if this mode defers to an ancestor.
    pub fn is_inherit(self) -> bool {
        matches!(self, Self::Inherit)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
