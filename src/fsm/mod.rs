//! Function-pointer gesture automaton.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌───────────────┬──────────────────────────────────────────┐ │
//! │  │ StateId       │ on_gesture                               │ │
//! │  ├───────────────┼──────────────────────────────────────────┤ │
//! │  │ Standby       │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  │ OpenLit       │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  │ ClosedLit     │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  │ OpenRainbow   │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  │ ClosedRainbow │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  │ RemoteInit    │ fn(GestureEvent, &ctx) -> Option<Trans>  │ │
//! │  └───────────────┴──────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! For each gesture the engine snapshots the guard predicates into a
//! [`GestureContext`], asks the current state's `on_gesture` what to do,
//! then issues the returned [`Action`]s in order, updates the
//! release-suppression latch and moves the current pointer.

pub mod context;
pub mod states;

use context::{Action, GestureContext, Suppression, Transition};
use log::{debug, info};

use crate::app::ports::{AdvertisingPort, ColorMode, FlowerPort, RandomSource};
use crate::color::Rgb;
use crate::picker::ColorPicker;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Classified touch gesture.  One touch yields `PressStart`, optionally
/// `LongPress` and `HoldPress`, then `Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureEvent {
    PressStart,
    Release,
    LongPress,
    HoldPress,
}

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all automaton states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Standby = 0,
    OpenLit = 1,
    ClosedLit = 2,
    OpenRainbow = 3,
    ClosedRainbow = 4,
    RemoteInit = 5,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    pub const ALL: [StateId; Self::COUNT] = [
        Self::Standby,
        Self::OpenLit,
        Self::ClosedLit,
        Self::OpenRainbow,
        Self::ClosedRainbow,
        Self::RemoteInit,
    ];

    /// Convert an index back to `StateId`.  Out-of-range falls back to
    /// `Standby` (asserts in debug builds).
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_else(|| {
            debug_assert!(false, "invalid state index: {idx}");
            Self::Standby
        })
    }

    /// Colour cycling is running in this state.
    pub fn is_rainbow(self) -> bool {
        matches!(self, Self::OpenRainbow | Self::ClosedRainbow)
    }
}

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Signature of a state's gesture handler.
/// Returns `Some(transition)` to act, or `None` to ignore the gesture.
pub type GestureFn = fn(GestureEvent, &GestureContext) -> Option<Transition>;

/// Static descriptor for a single automaton state.
/// Stored in a fixed-size array without heap or `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_gesture: GestureFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The gesture automaton.
///
/// Owns the state table, the current state, the release-suppression latch
/// and the colour picker whose cycle spans gestures.
pub struct Automaton {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    release_suppressed: bool,
    picker: ColorPicker,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Construct the automaton in `Standby`.
    pub fn new() -> Self {
        Self {
            table: states::build_state_table(),
            current: StateId::Standby as usize,
            release_suppressed: false,
            picker: ColorPicker::new(),
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn state_name(&self) -> &'static str {
        self.table[self.current].name
    }

    /// The next Release will be swallowed.
    pub fn is_release_suppressed(&self) -> bool {
        self.release_suppressed
    }

    pub fn picker(&self) -> &ColorPicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut ColorPicker {
        &mut self.picker
    }

    /// Guard snapshot for the current instant.
    pub fn context(&self, flower: &impl FlowerPort) -> GestureContext {
        GestureContext {
            release_suppressed: self.release_suppressed,
            flower_idle: flower.is_idle(),
            flower_lit: flower.is_lit(),
        }
    }

    /// Handle one gesture.
    ///
    /// Returns `Some((from, to))` when the current state changed.
    pub fn on_gesture(
        &mut self,
        event: GestureEvent,
        flower: &mut impl FlowerPort,
        advertising: &mut impl AdvertisingPort,
        rng: &mut impl RandomSource,
        scheme: &[Rgb],
    ) -> Option<(StateId, StateId)> {
        let ctx = self.context(flower);
        let Some(transition) = (self.table[self.current].on_gesture)(event, &ctx) else {
            debug!("Automaton: {:?} ignored in {}", event, self.state_name());
            return None;
        };

        for action in &transition.actions {
            match *action {
                Action::SetColor {
                    color,
                    mode,
                    duration_ms,
                } => flower.set_color(color, mode, duration_ms),
                Action::PickColor { duration_ms } => {
                    let color = self.picker.next_color(scheme, rng);
                    flower.set_color(color, ColorMode::Transition, duration_ms);
                }
                Action::SetPetals {
                    percent,
                    duration_ms,
                } => flower.set_petals_open_level(percent, duration_ms),
                Action::StartRainbow => flower.start_rainbow(),
                Action::StopRainbowRetainColor => flower.stop_rainbow_retain_color(),
                Action::StartAdvertising => advertising.start_advertising(),
                Action::StopAdvertising => advertising.stop_advertising(),
            }
        }

        match transition.suppression {
            Suppression::Keep => {}
            Suppression::Arm => self.release_suppressed = true,
            Suppression::Consume => self.release_suppressed = false,
        }

        self.change_state(transition.next)
    }

    /// A remote peer took control: adopt the state implied by the petals,
    /// without touching the actuator.
    pub fn on_remote_took_over(&mut self, flower: &impl FlowerPort) -> Option<(StateId, StateId)> {
        let next = if flower.petals_open_level() > 0 {
            StateId::OpenLit
        } else {
            StateId::Standby
        };
        info!("Automaton: remote took over");
        self.change_state(next)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn change_state(&mut self, next: StateId) -> Option<(StateId, StateId)> {
        let next_idx = next as usize;
        if next_idx == self.current {
            return None;
        }
        info!(
            "Automaton transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );
        let from = self.current_state();
        self.current = next_idx;
        Some((from, next))
    }
}
