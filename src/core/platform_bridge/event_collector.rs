//=========================================================================
// Event Collector
//=========================================================================
//
// Logic-side drain of the presentation → logic input channel.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame() → batches → StateTracker
//
// Draining is non-blocking and bounded per tick, so a flood of input can
// never stall the logic cadence. Pacing is done by the logic loop itself.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::InputEvent;

//=== TickControl =========================================================

/// Whether the logic loop keeps ticking after collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    input_batches: Vec<Vec<InputEvent>>,
}

impl EventCollector {
    /// Messages drained per tick at most; the rest wait for the next tick.
    const MAX_EVENTS_PER_TICK: usize = 100;

    pub(crate) fn new(receiver: Receiver<PlatformEvent>) -> Self {
        Self {
            receiver,
            input_batches: Vec::with_capacity(4),
        }
    }

    /// Drains pending messages into this tick's batches.
    ///
    /// Returns [`TickControl::Exit`] on a window-closed message or when
    /// the presentation side dropped its sender.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        self.input_batches.clear();

        for drained in 0..Self::MAX_EVENTS_PER_TICK {
            match self.receiver.try_recv() {
                Ok(PlatformEvent::Inputs { discrete, continuous }) => {
                    if !discrete.is_empty() {
                        self.input_batches.push(discrete);
                    }
                    if !continuous.is_empty() {
                        self.input_batches.push(continuous);
                    }
                }
                Ok(PlatformEvent::WindowClosed) => return TickControl::Exit,
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => return TickControl::Continue,
            }

            if drained + 1 == Self::MAX_EVENTS_PER_TICK && !self.receiver.is_empty() {
                warn!(
                    target: "scheduler",
                    "Input backlog: {} messages left for next tick",
                    self.receiver.len()
                );
            }
        }

        TickControl::Continue
    }

    /// Batches collected by the last [`EventCollector::collect_frame`].
    pub(crate) fn batches(&self) -> &[Vec<InputEvent>] {
        &self.input_batches
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
