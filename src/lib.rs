//=========================================================================
// Aetheric Scene Library Root
//
// A retained-mode scene tree driven by two execution contexts:
// - a fixed-cadence logic thread running the process pass
// - a winit presentation loop running the render pass
//
// Responsibilities:
// - Expose the engine facade (`EngineBuilder`, `Engine`)
// - Expose the scene model (`core`) for applications and tests
// - Keep the windowing backend (`platform`) private
//
// Typical usage:
// ```no_run
// use aetheric_scene::prelude::*;
//
// fn main() -> Result<(), EngineError> {
//     EngineBuilder::new().build().run()
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the scene tree, node traits, timers, tweens, input state
// and the scheduler primitives. `config` loads YAML application settings.
//
pub mod config;
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` owns the winit event loop, window and input translation.
// `engine` wires both loops together.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder};
pub use platform::{NullRenderer, Renderer};
