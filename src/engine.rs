//=========================================================================
// Aetheric Scene Engine
//
// Entry point: wires the scene, the logic thread and the presentation
// loop together.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──init()──>  Engine  ──run()──>  [Runtime]
//         │                          │                    │
//         ├─ with_tps()              └─ SceneHandle       ├─ spawns logic thread
//         ├─ with_failure_policy()      Lifecycle         ├─ runs platform loop
//         ├─ with_renderer()                              └─ joins, then Stopped
//         └─ from_config()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use crossbeam_channel::bounded;
use log::{error, info};

//=== Internal Dependencies ===============================================

use crate::config::AppConfig;
use crate::core::error::{EngineError, SceneError};
use crate::core::scheduler::{FailurePolicy, Lifecycle, LogicLoop, LogicSettings, SceneHandle};
use crate::core::tree::SceneTree;
use crate::platform::{self, NullRenderer, Platform, Presenter, Renderer, Wake, WindowSettings};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (logic ticks per second)
/// - **Channel capacity**: 128 input batches
/// - **Delta clamp**: 10 µs ..= 100 ms
/// - **Window**: "Aetheric Scene", 800x600
/// - **Failure policy**: [`FailurePolicy::Terminate`]
/// - **Renderer**: [`NullRenderer`]
///
/// # Examples
///
/// ```no_run
/// use aetheric_scene::prelude::*;
///
/// struct Title;
/// impl Node for Title {}
///
/// fn main() -> Result<(), EngineError> {
///     EngineBuilder::new()
///         .with_tps(120.0)
///         .with_title("Demo")
///         .build()
///         .init(|tree| {
///             let root = tree.insert("title", Title);
///             tree.set_root(root)?;
///             Ok(())
///         })?
///         .run()
/// }
/// ```
pub struct EngineBuilder {
    tps: f64,
    channel_capacity: usize,
    min_delta: Duration,
    max_delta: Duration,
    window: WindowSettings,
    paused: bool,
    failure_policy: FailurePolicy,
    renderer: Box<dyn Presenter>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        let logic = LogicSettings::default();
        Self {
            tps: 60.0,
            channel_capacity: 128,
            min_delta: logic.min_delta,
            max_delta: logic.max_delta,
            window: WindowSettings::default(),
            paused: false,
            failure_policy: logic.failure_policy,
            renderer: Box::new(NullRenderer),
        }
    }

    /// Sets the target ticks per second for the logic thread.
    ///
    /// # Panics
    ///
    /// Panics if `tps` is not a positive finite number.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps.is_finite() && tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets the capacity of the presentation → logic input channel.
    ///
    /// When the logic thread falls behind, batches beyond this are dropped.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Upper clamp on a single tick's delta.
    ///
    /// # Panics
    ///
    /// Panics if `max_delta` is zero.
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        assert!(!max_delta.is_zero(), "max_delta must be positive");
        self.max_delta = max_delta;
        self
    }

    /// Lower clamp on a single tick's delta.
    ///
    /// # Panics
    ///
    /// Panics if `min_delta` is zero.
    pub fn with_min_delta(mut self, min_delta: Duration) -> Self {
        assert!(!min_delta.is_zero(), "min_delta must be positive");
        self.min_delta = min_delta;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Initial inner window size in logical pixels.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window size must be non-zero, got {}x{}", width, height);
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Starts with the tree paused.
    pub fn start_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// What both loops do when a tick or paint fails.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_renderer<R: Renderer>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Applies every setting of a loaded [`AppConfig`].
    pub fn from_config(self, config: &AppConfig) -> Self {
        self.with_title(config.title.clone())
            .with_size(config.width, config.height)
            .with_tps(f64::from(config.tps))
            .with_max_delta(Duration::from_millis(config.max_delta_ms))
            .start_paused(config.paused)
            .with_failure_policy(config.failure_policy)
    }

    /// # Panics
    ///
    /// Panics if the configured `min_delta` exceeds `max_delta`.
    pub fn build(self) -> Engine {
        assert!(
            self.min_delta <= self.max_delta,
            "min_delta ({:?}) must not exceed max_delta ({:?})",
            self.min_delta,
            self.max_delta
        );
        info!(
            target: "scheduler",
            "Building engine (TPS: {}, channel: {}, policy: {:?})",
            self.tps, self.channel_capacity, self.failure_policy
        );

        let mut tree = SceneTree::new();
        tree.set_paused(self.paused);

        Engine {
            scene: SceneHandle::new(tree),
            lifecycle: Lifecycle::new(),
            logic: LogicSettings {
                period: Duration::from_secs_f64(1.0 / self.tps),
                min_delta: self.min_delta,
                max_delta: self.max_delta,
                failure_policy: self.failure_policy,
            },
            window: self.window,
            channel_capacity: self.channel_capacity,
            renderer: self.renderer,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Scene runtime. Create via [`EngineBuilder`].
///
/// ```text
/// Engine (main thread)
///   ├─► LogicLoop (thread "aetheric-logic", fixed TPS)
///   │     └─► SceneTree::process
///   │
///   └─► Platform (winit event loop)
///         └─► SceneTree::render
///
/// Shared: SceneHandle (lock), Lifecycle (state), input channel
/// ```
pub struct Engine {
    scene: SceneHandle,
    lifecycle: Lifecycle,
    logic: LogicSettings,
    window: WindowSettings,
    channel_capacity: usize,
    renderer: Box<dyn Presenter>,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Builds the initial scene before the loops start.
    pub fn init<F>(self, init_fn: F) -> Result<Self, EngineError>
    where
        F: FnOnce(&mut SceneTree) -> Result<(), SceneError>,
    {
        info!(target: "scheduler", "Initializing scene");
        self.scene.with(init_fn)??;
        Ok(self)
    }

    /// Handle to the shared scene, usable from other threads.
    pub fn scene(&self) -> SceneHandle {
        self.scene.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    //--- Execution --------------------------------------------------------

    /// Runs both loops and blocks until the application exits.
    ///
    /// # Lifecycle
    ///
    /// 1. Creates the event loop and the bounded input channel
    /// 2. `NotStarted → Running`, spawns the logic thread
    /// 3. Runs the platform event loop on this thread (blocks here)
    /// 4. On exit of either side: `ShuttingDown`, joins the logic thread
    /// 5. `Stopped`
    ///
    /// # Errors
    ///
    /// The first failure that terminated a loop: a presentation failure
    /// takes precedence over a logic failure.
    pub fn run(self) -> Result<(), EngineError> {
        info!(target: "scheduler", "Starting engine runtime ({:?} per tick)", self.logic.period);

        let event_loop = platform::create_event_loop()?;
        let proxy = event_loop.create_proxy();
        let (tx, rx) = bounded(self.channel_capacity);

        self.lifecycle.start();
        let policy = self.logic.failure_policy;
        let logic = LogicLoop::new(self.scene.clone(), rx, self.lifecycle.clone(), self.logic)
            .with_waker(move || {
                let _ = proxy.send_event(Wake);
            });
        let logic_handle = match logic.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                error!(target: "scheduler", "{}", err);
                self.lifecycle.request_shutdown();
                self.lifecycle.mark_stopped();
                return Err(err);
            }
        };

        let platform = Platform::new(
            self.window,
            tx,
            self.scene,
            self.lifecycle.clone(),
            self.renderer,
            policy,
        );
        let presented = platform.run(event_loop);
        if let Err(err) = &presented {
            error!(target: "platform", "Presentation loop failed: {}", err);
        }
        info!(target: "platform", "Platform event loop exited");

        self.lifecycle.request_shutdown();
        let ticked = match logic_handle.join() {
            Ok(result) => result,
            Err(_) => {
                error!(target: "scheduler", "Logic thread panicked");
                Err(EngineError::LogicThreadPanicked)
            }
        };

        self.lifecycle.mark_stopped();
        info!(target: "scheduler", "Engine shutdown complete");
        presented.and(ticked)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
