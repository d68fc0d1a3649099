//=========================================================================
// Scheduler
//=========================================================================
//
// Dual-loop scheduling around one shared scene.
//
// Architecture:
//   clock       → TickClock (clamped monotonic deltas)
//   lifecycle   → Lifecycle / AppState (shared shutdown state)
//   shared      → SceneHandle (the exclusion domain)
//   logic_loop  → LogicLoop (fixed-cadence process thread)
//
// The presentation side lives in the platform layer and only shares the
// `SceneHandle`, the `Lifecycle` and the input channel with this module.
//
//=========================================================================

//=== Module Declarations =================================================

mod clock;
mod lifecycle;
mod logic_loop;
mod shared;

//=== Public API ==========================================================

pub use clock::TickClock;
pub use lifecycle::{AppState, Lifecycle};
pub use logic_loop::FailurePolicy;
pub use shared::SceneHandle;

pub(crate) use logic_loop::{LogicLoop, LogicSettings};
