//=========================================================================
// Platform Subsystem
//
// The presentation context: owns the winit event loop and the window on
// the main thread, feeds input to the logic thread and paints the scene.
//
// Architecture:
// ```text
//  Main Thread (Platform):              Logic Thread (LogicLoop):
//  ┌────────────────────────────┐      ┌───────────────────────────┐
//  │  winit event loop          │      │  TickClock                │
//  │   ↓                        │      │   ↓                       │
//  │  InputProcessor            │      │  EventCollector           │
//  │   ↓                        │      │   ↓                       │
//  │  InputBuffer               │      │  lock SceneHandle         │
//  │   ↓                        │      │   ├─ StateTracker.advance │
//  │  RedrawRequested           │      │   └─ SceneTree.process    │
//  │   ├─ flush ────────────────┼──────┼─→ (bounded channel)       │
//  │   └─ lock SceneHandle      │      │                           │
//  │       └─ SceneTree.render  │      │  on exit: wake proxy ─────┼─┐
//  └────────────────────────────┘      └───────────────────────────┘ │
//           ↑ user_event(Wake) ──────────────────────────────────────┘
// ```
//
// Frame boundary is RedrawRequested: buffered input is sent as one
// message, then the scene is painted under the shared lock. Redraws are
// scheduled at a fixed presentation interval, independent of the logic
// tick rate.
//
// Shutdown:
// - close request → WindowClosed to the logic thread, Lifecycle shutdown,
//   event loop exit
// - logic thread exit → Wake user event → event loop exit
//
// winit requires the event loop on the main thread (macOS/iOS), so this
// runs on the thread that called `Engine::run()`.
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;

//=== External Crates =====================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::error::{EngineError, SceneError};
use crate::core::node::DrawingContext;
use crate::core::platform_bridge::{PlatformError, PlatformEvent};
use crate::core::scheduler::{FailurePolicy, Lifecycle, SceneHandle};
use crate::core::tree::SceneTree;
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== Renderer ============================================================

/// Frame provider for the render pass.
///
/// Each redraw calls `begin_frame`, hands the frame to every visible
/// visual as a [`DrawingContext`], then calls `end_frame`. Visuals
/// downcast the context to `Self::Frame` to draw.
pub trait Renderer: 'static {
    type Frame: DrawingContext;

    /// Called once the window exists.
    fn attach(&mut self, _window: Arc<Window>) {}

    /// Starts a frame for a surface of `size` physical pixels.
    fn begin_frame(&mut self, size: (u32, u32)) -> Self::Frame;

    /// Finishes the frame. Also called when a visual failed to draw.
    fn end_frame(&mut self, frame: Self::Frame);
}

/// Renderer that paints into nothing. Drives visuals with a `()` context.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    type Frame = ();

    fn begin_frame(&mut self, _size: (u32, u32)) -> Self::Frame {}

    fn end_frame(&mut self, _frame: Self::Frame) {}
}

//--- Type Erasure --------------------------------------------------------

/// Object-safe view of a [`Renderer`] held by the platform.
pub(crate) trait Presenter {
    fn attach(&mut self, window: Arc<Window>);
    fn present(&mut self, scene: &mut SceneTree, size: (u32, u32)) -> Result<(), SceneError>;
}

impl<R: Renderer> Presenter for R {
    fn attach(&mut self, window: Arc<Window>) {
        Renderer::attach(self, window);
    }

    fn present(&mut self, scene: &mut SceneTree, size: (u32, u32)) -> Result<(), SceneError> {
        let mut frame = self.begin_frame(size);
        let result = scene.render(&mut frame);
        self.end_frame(frame);
        result
    }
}

//=== Wake ================================================================

/// User event sent by the logic thread when it exits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Wake;

/// Creates the event loop. Must be called on the main thread.
pub(crate) fn create_event_loop() -> Result<EventLoop<Wake>, PlatformError> {
    EventLoop::<Wake>::with_user_event()
        .build()
        .map_err(|e| PlatformError::EventLoopCreation(e.to_string()))
}

//=== WindowSettings ======================================================

#[derive(Debug, Clone)]
pub(crate) struct WindowSettings {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Aetheric Scene".to_string(),
            width: 800,
            height: 600,
        }
    }
}

//=== Platform ============================================================

/// Window owner, input aggregator and painter.
///
/// Not `Send`: it stays on the main thread. It talks to the logic thread
/// only through the input channel, the shared scene and the lifecycle.
pub(crate) struct Platform {
    window: Option<Arc<Window>>,
    settings: WindowSettings,
    buffer: InputBuffer,
    input_processor: InputProcessor,
    event_sender: Sender<PlatformEvent>,
    scene: SceneHandle,
    lifecycle: Lifecycle,
    renderer: Box<dyn Presenter>,
    policy: FailurePolicy,
    next_frame: Instant,
    failure: Option<EngineError>,
}

impl Platform {
    const PRESENT_INTERVAL: Duration = Duration::from_micros(16_667);

    //--- Construction -----------------------------------------------------

    pub(crate) fn new(
        settings: WindowSettings,
        event_sender: Sender<PlatformEvent>,
        scene: SceneHandle,
        lifecycle: Lifecycle,
        renderer: Box<dyn Presenter>,
        policy: FailurePolicy,
    ) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            settings,
            buffer: InputBuffer::new(),
            input_processor: InputProcessor::new(),
            event_sender,
            scene,
            lifecycle,
            renderer,
            policy,
            next_frame: Instant::now(),
            failure: None,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Pumps the event loop until either side shuts down.
    ///
    /// Returns the first paint failure that terminated the loop, if any.
    pub(crate) fn run(mut self, event_loop: EventLoop<Wake>) -> Result<(), EngineError> {
        debug!(target: "platform", "Starting winit event loop");

        event_loop
            .run_app(&mut self)
            .map_err(|e| PlatformError::EventLoopExecution(e.to_string()))?;

        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    //--- Internal Helpers -------------------------------------------------

    /// Sends this frame's input to the logic thread.
    ///
    /// Never blocks: a full or disconnected channel drops the batch.
    fn flush_input_buffer(&mut self) {
        let Some((discrete, continuous)) = self.buffer.drain() else {
            return;
        };
        let (discrete_count, continuous_count) = (discrete.len(), continuous.len());

        trace!(
            target: "platform::input",
            "Flushing {} discrete + {} continuous events",
            discrete_count,
            continuous_count
        );

        match self.event_sender.try_send(PlatformEvent::Inputs { discrete, continuous }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(
                target: "platform::input",
                "Input channel full, dropping {} events",
                discrete_count + continuous_count
            ),
            Err(TrySendError::Disconnected(_)) => warn!(
                target: "platform::input",
                "Channel disconnected, dropping {} events",
                discrete_count + continuous_count
            ),
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        match &self.window {
            Some(window) => {
                let size = window.inner_size();
                (size.width, size.height)
            }
            None => (self.settings.width, self.settings.height),
        }
    }

    /// Renders one frame under the shared lock.
    fn paint(&mut self) -> Result<(), EngineError> {
        let size = self.surface_size();
        let mut tree = self.scene.lock()?;
        self.renderer.present(&mut tree, size)?;
        Ok(())
    }

    /// Frame boundary: flush input, then paint.
    fn redraw(&mut self) -> bool {
        self.flush_input_buffer();

        match self.paint() {
            Ok(()) => true,
            Err(EngineError::Scene(err)) if self.policy == FailurePolicy::LogAndContinue => {
                error!(target: "platform", "Paint failed, continuing: {}", err);
                true
            }
            Err(err) => {
                error!(target: "platform", "Paint failed, terminating: {}", err);
                self.failure = Some(err);
                self.lifecycle.request_shutdown();
                false
            }
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        let _ = self.event_sender.try_send(PlatformEvent::WindowClosed);
        self.lifecycle.request_shutdown();
        event_loop.exit();
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler<Wake> for Platform {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    /// Creates the window on first resume. Mobile platforms may resume
    /// more than once.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (resume)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.renderer.attach(window.clone());
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.failure = Some(PlatformError::WindowCreation(e.to_string()).into());
                self.close(event_loop);
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: Wake) {
        if !self.lifecycle.is_running() {
            debug!(target: "platform", "Logic thread exited, leaving event loop");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if !self.lifecycle.is_running() {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.close(event_loop);
            }

            WindowEvent::ModifiersChanged(state) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", state);
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self
                    .input_processor
                    .process_mouse_move(position.x as f32, position.y as f32);
                self.buffer.push_continuous(event);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(event) = self.input_processor.process_mouse_wheel(delta) {
                    self.buffer.push_continuous(event);
                }
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                match self.input_processor.process_key_event(&key_event) {
                    Some(event) => self.buffer.push_discrete(event),
                    None => trace!(target: "platform::input", "Unmapped key ignored"),
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(button, state);
                self.buffer.push_discrete(event);
            }

            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    event_loop.exit();
                    return;
                }
                self.next_frame = Instant::now() + Self::PRESENT_INTERVAL;
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
            }

            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
