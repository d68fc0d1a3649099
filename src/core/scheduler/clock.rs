//=========================================================================
// Tick Clock
//=========================================================================
//
// Monotonic elapsed-time source for the logic loop.
//
// Raw deltas are clamped to [min_delta, max_delta]:
//   - a zero delta (first tick, coarse timers) becomes min_delta
//   - a stall (debugger, system sleep) becomes max_delta instead of a
//     runaway catch-up tick
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

use log::warn;

//=== TickClock ===========================================================

#[derive(Debug, Clone)]
pub struct TickClock {
    last: Option<Instant>,
    min_delta: Duration,
    max_delta: Duration,
}

impl TickClock {
    pub const DEFAULT_MIN_DELTA: Duration = Duration::from_micros(10);
    pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

    /// # Panics
    ///
    /// Panics if `min_delta` is zero or greater than `max_delta`.
    pub fn new(min_delta: Duration, max_delta: Duration) -> Self {
        assert!(!min_delta.is_zero(), "min_delta must be positive");
        assert!(min_delta <= max_delta, "min_delta must not exceed max_delta");
        Self {
            last: None,
            min_delta,
            max_delta,
        }
    }

    /// Samples the clock and returns the clamped time since the last sample.
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    /// Like [`TickClock::tick`] with an explicit sample time.
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let raw = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        self.clamp(raw)
    }

    /// Clamps a raw delta into the configured range.
    pub fn clamp(&self, raw: Duration) -> Duration {
        if raw > self.max_delta {
            warn!(
                target: "scheduler",
                "Tick stalled for {:?}, clamped to {:?}",
                raw, self.max_delta
            );
        }
        raw.clamp(self.min_delta, self.max_delta)
    }

    pub fn min_delta(&self) -> Duration {
        self.min_delta
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_DELTA, Self::DEFAULT_MAX_DELTA)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
