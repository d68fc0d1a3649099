//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Messages the presentation thread sends to the logic thread, and the
// errors the presentation side can fail with.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== PlatformEvent =======================================================

/// Presentation → logic messages, sent over a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub(crate) enum PlatformEvent {
    /// One redraw worth of buffered input.
    Inputs {
        discrete: Vec<InputEvent>,
        continuous: Vec<InputEvent>,
    },

    /// The window was closed; the logic loop exits without ticking again.
    WindowClosed,
}

//=== PlatformError =======================================================

/// Presentation-side failures.
///
/// Payloads are rendered to strings so the error stays `Send + Sync`
/// regardless of the windowing backend's own error types.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS refused to create an event loop.
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(String),

    /// The event loop returned an error while running.
    #[error("event loop error: {0}")]
    EventLoopExecution(String),

    /// The window could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(String),
}
