//! Guard inputs and transition outputs of the gesture table.
//!
//! A state handler sees a [`GestureContext`] snapshot (the guard
//! predicates) and answers with a [`Transition`]: the target state, the
//! ordered actuator/radio [`Action`]s to issue, and what happens to the
//! release-suppression latch.  Handlers never touch hardware; the engine
//! in [`super::Automaton`] executes the returned actions.

use crate::app::ports::ColorMode;
use crate::color::Rgb;

use super::StateId;

/// Maximum actions a single transition can issue.
pub const MAX_ACTIONS: usize = 4;

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Snapshot of every predicate a transition may be guarded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureContext {
    /// The next Release belongs to a gesture that was already handled.
    pub release_suppressed: bool,
    /// No colour or petal transition is in flight.
    pub flower_idle: bool,
    /// The light is currently on.
    pub flower_lit: bool,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// One side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Render a fixed colour.
    SetColor {
        color: Rgb,
        mode: ColorMode,
        duration_ms: u32,
    },
    /// Draw the next palette colour and fade to it.
    PickColor { duration_ms: u32 },
    /// Move the petals.
    SetPetals { percent: u8, duration_ms: u32 },
    StartRainbow,
    StopRainbowRetainColor,
    StartAdvertising,
    StopAdvertising,
}

/// Effect of a transition on the release-suppression latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Leave the latch as it is.
    Keep,
    /// Swallow the next Release.
    Arm,
    /// This Release was the swallowed one; clear the latch.
    Consume,
}

/// A decided transition.  `next` may equal the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: StateId,
    pub actions: heapless::Vec<Action, MAX_ACTIONS>,
    pub suppression: Suppression,
}

impl Transition {
    pub fn to(next: StateId) -> Self {
        Self {
            next,
            actions: heapless::Vec::new(),
            suppression: Suppression::Keep,
        }
    }

    /// Append an action.
    pub fn then(mut self, action: Action) -> Self {
        let pushed = self.actions.push(action);
        debug_assert!(pushed.is_ok(), "transition exceeds {MAX_ACTIONS} actions");
        self
    }

    /// Swallow the Release that ends the current gesture.
    pub fn arming_suppression(mut self) -> Self {
        self.suppression = Suppression::Arm;
        self
    }

    /// Clear the latch and stay in `current` with no actions.
    pub fn consume_suppression(current: StateId) -> Self {
        Self {
            next: current,
            actions: heapless::Vec::new(),
            suppression: Suppression::Consume,
        }
    }
}
