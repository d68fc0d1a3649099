//=========================================================================
// Platform Bridge
//=========================================================================
//
// Contract between the presentation thread (winit) and the logic thread.
//
// Components:
// - `interface`: messages and errors crossing the boundary
// - `event_collector`: logic-side draining of the input channel
//
// Only input crosses this channel. The scene itself is shared through
// `SceneHandle`, and shutdown through `Lifecycle`.
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Public API ==========================================================

pub use interface::PlatformError;

pub(crate) use event_collector::{EventCollector, TickControl};
pub(crate) use interface::PlatformEvent;
