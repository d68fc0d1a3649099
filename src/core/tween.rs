//=========================================================================
// Tweens
//=========================================================================
//
// Time-driven animation tasks bound to an owner node.
//
// Architecture:
//   Tween
//     ├─ owner: NodeId          (resolves Inherit mode, receives values)
//     ├─ mode: ProcessMode      (own pause policy)
//     └─ steps: [Property | Interval | Callback]  run sequentially
//
// Time is accumulated as `Duration` and carried across step boundaries,
// so one large advance and many small ones summing to the same total end
// in the same state.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::core::error::HookResult;
use crate::core::node::{Node, NodeId, ProcessMode};
use crate::core::tree::SceneTree;

//=== Types ===============================================================

/// Applies an interpolated value to the tween's owner node.
pub type PropertySetter = Box<dyn FnMut(&mut dyn Node, f32) + Send>;

/// Callback step. Runs with full tree access.
pub type TweenCallback = Box<dyn FnMut(&mut SceneTree) -> HookResult + Send>;

/// Identifier of a tween in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub(crate) u64);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

//=== Easing ==============================================================

/// Easing curve applied to a property step's normalized progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    SineInOut,
}

impl Easing {
    /// Maps progress `t` in `[0, 1]` to eased progress. `0 → 0` and `1 → 1`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => t * (2.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::SineInOut => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
        }
    }
}

//=== Steps ===============================================================

enum StepKind {
    Property {
        from: f32,
        to: f32,
        easing: Easing,
        setter: PropertySetter,
    },
    Interval,
    Callback(TweenCallback),
}

struct TweenStep {
    kind: StepKind,
    duration: Duration,
}

/// Result of pumping a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pump {
    /// All fed time was consumed; more steps remain.
    Idle,
    /// Positioned on a callback step; run it with [`Tween::run_callback`].
    Callback,
    /// Every step completed.
    Finished,
}

//=== Tween ===============================================================

/// A running animation.
///
/// Build it through [`SceneTree::create_tween`] and chain steps:
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// # use std::time::Duration;
/// # struct Fader { alpha: f32 }
/// # impl Node for Fader {}
/// let mut tree = SceneTree::new();
/// let fader = tree.insert("fader", Fader { alpha: 0.0 });
/// tree.set_root(fader).unwrap();
///
/// tree.create_tween(fader, ProcessMode::Inherit)
///     .tween_property(0.0, 1.0, Duration::from_millis(250), Easing::QuadOut, |node, v| {
///         if let Some(f) = node.downcast_mut::<Fader>() {
///             f.alpha = v;
///         }
///     })
///     .interval(Duration::from_millis(100));
/// ```
pub struct Tween {
    id: TweenId,
    owner: NodeId,
    mode: ProcessMode,
    active: bool,
    steps: Vec<TweenStep>,
    current: usize,
    step_elapsed: Duration,
    pending: Duration,
    total_elapsed: Duration,
    created_tick: u64,
}

impl Tween {
    pub(crate) fn new(id: TweenId, owner: NodeId, mode: ProcessMode, created_tick: u64) -> Self {
        Self {
            id,
            owner,
            mode,
            active: true,
            steps: Vec::new(),
            current: 0,
            step_elapsed: Duration::ZERO,
            pending: Duration::ZERO,
            total_elapsed: Duration::ZERO,
            created_tick,
        }
    }

    //--- Builder ----------------------------------------------------------

    /// Appends a step interpolating `from → to` over `duration`.
    pub fn tween_property<F>(
        &mut self,
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
        setter: F,
    ) -> &mut Self
    where
        F: FnMut(&mut dyn Node, f32) + Send + 'static,
    {
        self.steps.push(TweenStep {
            kind: StepKind::Property {
                from,
                to,
                easing,
                setter: Box::new(setter),
            },
            duration,
        });
        self
    }

    /// Appends a wait step.
    pub fn interval(&mut self, duration: Duration) -> &mut Self {
        self.steps.push(TweenStep {
            kind: StepKind::Interval,
            duration,
        });
        self
    }

    /// Appends an instantaneous callback step.
    pub fn callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&mut SceneTree) -> HookResult + Send + 'static,
    {
        self.steps.push(TweenStep {
            kind: StepKind::Callback(Box::new(callback)),
            duration: Duration::ZERO,
        });
        self
    }

    //--- Queries ----------------------------------------------------------

    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn process_mode(&self) -> ProcessMode {
        self.mode
    }

    /// `false` once finished or killed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Total time consumed by steps so far.
    pub fn elapsed(&self) -> Duration {
        self.total_elapsed
    }

    pub(crate) fn created_tick(&self) -> u64 {
        self.created_tick
    }

    /// Sum of all step durations.
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Stops the tween. It is removed from the tree on its next advancement.
    pub fn kill(&mut self) {
        self.active = false;
    }

    //--- Advancement ------------------------------------------------------

    /// Adds elapsed time to be consumed by the next [`Tween::pump`].
    pub(crate) fn feed(&mut self, delta: Duration) {
        if self.active {
            self.pending += delta;
        }
    }

    /// Consumes fed time, applying property steps to `target`.
    pub(crate) fn pump(&mut self, mut target: Option<&mut dyn Node>) -> Pump {
        if !self.active {
            return Pump::Finished;
        }

        while let Some(step) = self.steps.get_mut(self.current) {
            if matches!(step.kind, StepKind::Callback(_)) {
                return Pump::Callback;
            }

            let left = step.duration.saturating_sub(self.step_elapsed);
            let completes = self.pending >= left;
            let progress = if completes {
                self.pending -= left;
                self.total_elapsed += left;
                self.step_elapsed = Duration::ZERO;
                1.0
            } else {
                self.step_elapsed += self.pending;
                self.total_elapsed += self.pending;
                self.pending = Duration::ZERO;
                self.step_elapsed.as_secs_f32() / step.duration.as_secs_f32()
            };

            if let StepKind::Property {
                from,
                to,
                easing,
                setter,
            } = &mut step.kind
            {
                if let Some(node) = target.as_deref_mut() {
                    let eased = easing.apply(progress);
                    setter(node, *from + (*to - *from) * eased);
                }
            }

            if !completes {
                return Pump::Idle;
            }
            self.current += 1;
        }

        self.active = false;
        self.pending = Duration::ZERO;
        Pump::Finished
    }

    /// Runs the callback step the tween is positioned on and moves past it.
    pub(crate) fn run_callback(&mut self, tree: &mut SceneTree) -> HookResult {
        let Some(step) = self.steps.get_mut(self.current) else {
            return Ok(());
        };
        self.current += 1;
        match &mut step.kind {
            StepKind::Callback(callback) => callback(tree),
            _ => Ok(()),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
