//=========================================================================
// Logic Loop
//=========================================================================
//
// Fixed-cadence driver of `SceneTree::process`, run on its own thread.
//
// Each iteration:
//   1. sample + clamp elapsed time        (TickClock)
//   2. drain input batches                (EventCollector)
//   3. lock the scene
//        advance input edges → process(delta)
//   4. unlock
//   5. sleep for the rest of the period, or yield
//
// Stop requests are observed between iterations only. On exit the loop
// requests shutdown and wakes the presentation thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{error, info};
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::clock::TickClock;
use super::lifecycle::Lifecycle;
use super::shared::SceneHandle;
use crate::core::error::EngineError;
use crate::core::platform_bridge::{EventCollector, PlatformEvent, TickControl};

//=== FailurePolicy =======================================================

/// What the loop driver does when a tick or paint returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the error and shut the application down.
    #[default]
    Terminate,

    /// Log the error and attempt the next tick.
    LogAndContinue,
}

//=== LogicSettings =======================================================

#[derive(Debug, Clone)]
pub(crate) struct LogicSettings {
    pub(crate) period: Duration,
    pub(crate) min_delta: Duration,
    pub(crate) max_delta: Duration,
    pub(crate) failure_policy: FailurePolicy,
}

impl Default for LogicSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / 60.0),
            min_delta: TickClock::DEFAULT_MIN_DELTA,
            max_delta: TickClock::DEFAULT_MAX_DELTA,
            failure_policy: FailurePolicy::Terminate,
        }
    }
}

//=== LogicLoop ===========================================================

type Waker = Box<dyn Fn() + Send>;

pub(crate) struct LogicLoop {
    scene: SceneHandle,
    collector: EventCollector,
    clock: TickClock,
    lifecycle: Lifecycle,
    period: Duration,
    policy: FailurePolicy,
    waker: Option<Waker>,
}

impl LogicLoop {
    pub(crate) const THREAD_NAME: &'static str = "aetheric-logic";

    pub(crate) fn new(
        scene: SceneHandle,
        receiver: Receiver<PlatformEvent>,
        lifecycle: Lifecycle,
        settings: LogicSettings,
    ) -> Self {
        Self {
            scene,
            collector: EventCollector::new(receiver),
            clock: TickClock::new(settings.min_delta, settings.max_delta),
            lifecycle,
            period: settings.period,
            policy: settings.failure_policy,
            waker: None,
        }
    }

    /// Called once when the loop exits, to wake the presentation thread.
    pub(crate) fn with_waker(mut self, waker: impl Fn() + Send + 'static) -> Self {
        self.waker = Some(Box::new(waker));
        self
    }

    //--- Execution --------------------------------------------------------

    /// Runs the loop on the dedicated logic thread.
    pub(crate) fn spawn(self) -> Result<JoinHandle<Result<(), EngineError>>, EngineError> {
        let handle = thread::Builder::new()
            .name(Self::THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(EngineError::ThreadSpawn)?;
        info!(target: "scheduler", "Spawned {} thread", Self::THREAD_NAME);
        Ok(handle)
    }

    /// Ticks until the lifecycle leaves `Running` or a tick terminates.
    pub(crate) fn run(mut self) -> Result<(), EngineError> {
        info!(target: "scheduler", "Logic loop started ({:?} per tick)", self.period);

        let result = self.run_ticks();

        self.lifecycle.request_shutdown();
        if let Some(waker) = &self.waker {
            waker();
        }

        info!(target: "scheduler", "Logic loop exited");
        result
    }

    fn run_ticks(&mut self) -> Result<(), EngineError> {
        while self.lifecycle.is_running() {
            let started = Instant::now();
            let delta = self.clock.tick_at(started);

            if self.tick(delta)? == TickControl::Exit {
                break;
            }

            match self.period.checked_sub(started.elapsed()) {
                Some(rest) if !rest.is_zero() => thread::sleep(rest),
                _ => thread::yield_now(),
            }
        }
        Ok(())
    }

    /// One iteration without clock sampling or pacing.
    ///
    /// A window-closed message ends the loop before the scene is touched.
    /// A failing tick is handled by the configured [`FailurePolicy`].
    pub(crate) fn tick(&mut self, delta: Duration) -> Result<TickControl, EngineError> {
        if self.collector.collect_frame() == TickControl::Exit {
            return Ok(TickControl::Exit);
        }

        let mut tree = self.scene.lock()?;
        tree.input_mut().advance(self.collector.batches());

        if let Err(err) = tree.process(delta) {
            match self.policy {
                FailurePolicy::Terminate => {
                    error!(target: "scheduler", "Tick failed, terminating: {}", err);
                    return Err(err.into());
                }
                FailurePolicy::LogAndContinue => {
                    error!(target: "scheduler", "Tick failed, continuing: {}", err);
                }
            }
        }
        Ok(TickControl::Continue)
    }
}

impl fmt::Debug for LogicLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicLoop")
            .field("period", &self.period)
            .field("policy", &self.policy)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
