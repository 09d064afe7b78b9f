//! Concrete gesture handlers and table builder.
//!
//! Each state is defined by a plain `fn` pointer without closures or dynamic
//! dispatch, no heap.  Handlers are pure: they read the guard snapshot and
//! return the transition to take.
//!
//! ```text
//!  STANDBY ──tap──▶ OPEN_LIT ──tap──▶ CLOSED_LIT ──tap──▶ STANDBY
//!  STANDBY ──long──▶ CLOSED_RAINBOW ──press──▶ CLOSED_LIT
//!  OPEN_LIT ──long──▶ OPEN_RAINBOW ──press──▶ OPEN_LIT
//!  STANDBY | CLOSED_RAINBOW ──hold──▶ REMOTE_INIT ──press──▶ STANDBY
//! ```

use super::context::{Action, GestureContext, Transition};
use super::{GestureEvent, StateDescriptor, StateId};
use crate::app::ports::ColorMode;
use crate::color::{ATTENTION_BLUE, BLACK};

/// Petal / colour timing for a tap-driven open or close.
pub const OPEN_CLOSE_MS: u32 = 5000;
/// Fade-out when the flower goes to standby from a lit state.
pub const SHUTDOWN_FADE_MS: u32 = 2000;
/// Fade-out when leaving pairing mode.
pub const REMOTE_CANCEL_FADE_MS: u32 = 500;
/// Attention flash when pairing mode starts.
pub const ATTENTION_FLASH_MS: u32 = 1000;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Standby,
            name: "Standby",
            on_gesture: standby_gesture,
        },
        StateDescriptor {
            id: StateId::OpenLit,
            name: "OpenLit",
            on_gesture: open_lit_gesture,
        },
        StateDescriptor {
            id: StateId::ClosedLit,
            name: "ClosedLit",
            on_gesture: closed_lit_gesture,
        },
        StateDescriptor {
            id: StateId::OpenRainbow,
            name: "OpenRainbow",
            on_gesture: open_rainbow_gesture,
        },
        StateDescriptor {
            id: StateId::ClosedRainbow,
            name: "ClosedRainbow",
            on_gesture: closed_rainbow_gesture,
        },
        StateDescriptor {
            id: StateId::RemoteInit,
            name: "RemoteInit",
            on_gesture: remote_init_gesture,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared rules
// ═══════════════════════════════════════════════════════════════════════════

/// Release handling common to every state: a suppressed Release only
/// clears the latch, a Release while the flower is moving is dropped.
fn on_release(
    current: StateId,
    ctx: &GestureContext,
    step: impl FnOnce() -> Option<Transition>,
) -> Option<Transition> {
    if ctx.release_suppressed {
        return Some(Transition::consume_suppression(current));
    }
    if !ctx.flower_idle {
        return None;
    }
    step()
}

/// LongPress from anywhere starts the rainbow.  Only an open, lit flower
/// keeps its petals open.
fn start_rainbow(current: StateId) -> Transition {
    let next = if current == StateId::OpenLit {
        StateId::OpenRainbow
    } else {
        StateId::ClosedRainbow
    };
    Transition::to(next)
        .then(Action::StartRainbow)
        .arming_suppression()
}

/// HoldPress: announce pairing mode and advertise.
fn enter_remote_init() -> Transition {
    Transition::to(StateId::RemoteInit)
        .then(Action::SetColor {
            color: ATTENTION_BLUE,
            mode: ColorMode::Flash,
            duration_ms: ATTENTION_FLASH_MS,
        })
        .then(Action::StartAdvertising)
        .arming_suppression()
}

/// PressStart during a rainbow freezes the colour.
fn leave_rainbow(next: StateId) -> Transition {
    Transition::to(next)
        .then(Action::StopRainbowRetainColor)
        .arming_suppression()
}

// ═══════════════════════════════════════════════════════════════════════════
//  STANDBY: closed, dark
// ═══════════════════════════════════════════════════════════════════════════

fn standby_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::Release => on_release(StateId::Standby, ctx, || {
            let mut t = Transition::to(StateId::OpenLit);
            if !ctx.flower_lit {
                t = t.then(Action::PickColor {
                    duration_ms: OPEN_CLOSE_MS,
                });
            }
            Some(t.then(Action::SetPetals {
                percent: 100,
                duration_ms: OPEN_CLOSE_MS,
            }))
        }),
        GestureEvent::LongPress => Some(start_rainbow(StateId::Standby)),
        GestureEvent::HoldPress => Some(enter_remote_init()),
        GestureEvent::PressStart => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN_LIT: petals open, static colour
// ═══════════════════════════════════════════════════════════════════════════

fn open_lit_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::Release => on_release(StateId::OpenLit, ctx, || {
            Some(Transition::to(StateId::ClosedLit).then(Action::SetPetals {
                percent: 0,
                duration_ms: OPEN_CLOSE_MS,
            }))
        }),
        GestureEvent::LongPress => Some(start_rainbow(StateId::OpenLit)),
        GestureEvent::PressStart | GestureEvent::HoldPress => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED_LIT: petals closed, light still on
// ═══════════════════════════════════════════════════════════════════════════

fn closed_lit_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::Release => on_release(StateId::ClosedLit, ctx, || {
            Some(Transition::to(StateId::Standby).then(Action::SetColor {
                color: BLACK,
                mode: ColorMode::Transition,
                duration_ms: SHUTDOWN_FADE_MS,
            }))
        }),
        GestureEvent::LongPress => Some(start_rainbow(StateId::ClosedLit)),
        GestureEvent::PressStart | GestureEvent::HoldPress => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN_RAINBOW / CLOSED_RAINBOW: hue sweep running
// ═══════════════════════════════════════════════════════════════════════════

fn open_rainbow_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::PressStart => Some(leave_rainbow(StateId::OpenLit)),
        GestureEvent::Release => on_release(StateId::OpenRainbow, ctx, || None),
        GestureEvent::LongPress => Some(start_rainbow(StateId::OpenRainbow)),
        GestureEvent::HoldPress => None,
    }
}

fn closed_rainbow_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::PressStart => Some(leave_rainbow(StateId::ClosedLit)),
        GestureEvent::Release => on_release(StateId::ClosedRainbow, ctx, || None),
        GestureEvent::LongPress => Some(start_rainbow(StateId::ClosedRainbow)),
        // A single long touch passes LongPress before HoldPress, so pairing
        // mode is reached from here.
        GestureEvent::HoldPress => Some(enter_remote_init()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  REMOTE_INIT: advertising, waiting for a peer
// ═══════════════════════════════════════════════════════════════════════════

fn remote_init_gesture(event: GestureEvent, ctx: &GestureContext) -> Option<Transition> {
    match event {
        GestureEvent::PressStart => Some(
            Transition::to(StateId::Standby)
                .then(Action::StopAdvertising)
                .then(Action::SetColor {
                    color: BLACK,
                    mode: ColorMode::Transition,
                    duration_ms: REMOTE_CANCEL_FADE_MS,
                }),
        ),
        GestureEvent::Release => on_release(StateId::RemoteInit, ctx, || None),
        GestureEvent::LongPress => Some(start_rainbow(StateId::RemoteInit)),
        GestureEvent::HoldPress => None,
    }
}
