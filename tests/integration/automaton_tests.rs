//! Gesture automaton against a recording flower.
//!
//! Every test drives [`Automaton::on_gesture`] directly and asserts the
//! exact actuator commands, so the timing constants and call order are
//! pinned here as well as in the unit tests.

use floower::app::ports::{AdvertisingPort, ColorMode, FlowerPort};
use floower::color::{self, ATTENTION_BLUE, BLACK, Rgb};
use floower::fsm::{Automaton, GestureEvent, StateId};

use super::mock_hw::{FlowerCall, MockFlower, ScriptedRandom};

// ── Local advertising mock ────────────────────────────────────

#[derive(Default)]
struct Adv {
    active: bool,
    starts: u32,
    stops: u32,
}

impl AdvertisingPort for Adv {
    fn start_advertising(&mut self) {
        self.active = true;
        self.starts += 1;
    }

    fn stop_advertising(&mut self) {
        self.active = false;
        self.stops += 1;
    }
}

struct Rig {
    automaton: Automaton,
    flower: MockFlower,
    adv: Adv,
    rng: ScriptedRandom,
    scheme: color::ColorScheme,
}

impl Rig {
    fn new(draws: &[usize]) -> Self {
        Self {
            automaton: Automaton::new(),
            flower: MockFlower::new(),
            adv: Adv::default(),
            rng: ScriptedRandom::new(draws),
            scheme: color::default_scheme(),
        }
    }

    fn feed(&mut self, event: GestureEvent) -> Option<(StateId, StateId)> {
        self.automaton.on_gesture(
            event,
            &mut self.flower,
            &mut self.adv,
            &mut self.rng,
            &self.scheme,
        )
    }

    fn state(&self) -> StateId {
        self.automaton.current_state()
    }
}

// ── Tap cycle ─────────────────────────────────────────────────

#[test]
fn tap_cycle_open_close_shutdown() {
    let mut rig = Rig::new(&[3]);

    assert_eq!(
        rig.feed(GestureEvent::Release),
        Some((StateId::Standby, StateId::OpenLit))
    );
    assert_eq!(
        rig.flower.take_calls(),
        vec![
            FlowerCall::SetColor {
                color: color::DEFAULT_SCHEME[3],
                mode: ColorMode::Transition,
                duration_ms: 5000,
            },
            FlowerCall::SetPetals {
                percent: 100,
                duration_ms: 5000,
            },
        ]
    );

    assert_eq!(
        rig.feed(GestureEvent::Release),
        Some((StateId::OpenLit, StateId::ClosedLit))
    );
    assert_eq!(
        rig.flower.take_calls(),
        vec![FlowerCall::SetPetals {
            percent: 0,
            duration_ms: 5000,
        }]
    );

    assert_eq!(
        rig.feed(GestureEvent::Release),
        Some((StateId::ClosedLit, StateId::Standby))
    );
    assert_eq!(
        rig.flower.take_calls(),
        vec![FlowerCall::SetColor {
            color: BLACK,
            mode: ColorMode::Transition,
            duration_ms: 2000,
        }]
    );
    assert!(!rig.flower.is_lit());
}

#[test]
fn lit_standby_opens_without_picking() {
    let mut rig = Rig::new(&[0]);
    rig.flower.color = Rgb::new(1, 2, 3);

    rig.feed(GestureEvent::Release);
    assert_eq!(rig.state(), StateId::OpenLit);
    assert_eq!(
        rig.flower.take_calls(),
        vec![FlowerCall::SetPetals {
            percent: 100,
            duration_ms: 5000,
        }]
    );
    assert_eq!(rig.automaton.picker().mask().count(), 0);
}

#[test]
fn releases_while_moving_are_dropped() {
    let mut rig = Rig::new(&[0]);
    rig.flower.idle = false;

    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert!(rig.flower.calls.is_empty());
    assert_eq!(rig.state(), StateId::Standby);
    assert!(!rig.automaton.is_release_suppressed());
}

#[test]
fn press_start_alone_does_nothing_outside_special_states() {
    let mut rig = Rig::new(&[0]);
    for _ in 0..3 {
        assert_eq!(rig.feed(GestureEvent::PressStart), None);
    }
    assert!(rig.flower.calls.is_empty());
}

// ── Rainbow ───────────────────────────────────────────────────

#[test]
fn long_press_release_is_swallowed_once() {
    let mut rig = Rig::new(&[0]);

    rig.feed(GestureEvent::PressStart);
    assert_eq!(
        rig.feed(GestureEvent::LongPress),
        Some((StateId::Standby, StateId::ClosedRainbow))
    );
    assert_eq!(rig.flower.take_calls(), vec![FlowerCall::StartRainbow]);
    assert!(rig.automaton.is_release_suppressed());

    // End of the long touch.
    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert!(!rig.automaton.is_release_suppressed());
    assert!(rig.flower.calls.is_empty());

    // Next touch freezes the colour and swallows its own release.
    assert_eq!(
        rig.feed(GestureEvent::PressStart),
        Some((StateId::ClosedRainbow, StateId::ClosedLit))
    );
    assert_eq!(rig.flower.take_calls(), vec![FlowerCall::StopRainbow]);
    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert!(rig.flower.calls.is_empty());

    // A further tap shuts down.
    rig.feed(GestureEvent::Release);
    assert_eq!(rig.state(), StateId::Standby);
    assert_eq!(rig.flower.last_color(), Some(BLACK));
}

#[test]
fn rainbow_exit_keeps_the_shown_colour() {
    let mut rig = Rig::new(&[2]);
    rig.feed(GestureEvent::Release);
    assert_eq!(rig.state(), StateId::OpenLit);

    rig.feed(GestureEvent::PressStart);
    rig.feed(GestureEvent::LongPress);
    assert_eq!(rig.state(), StateId::OpenRainbow);
    rig.feed(GestureEvent::Release);

    let shown = rig.flower.rainbow_color;
    rig.feed(GestureEvent::PressStart);
    assert_eq!(rig.state(), StateId::OpenLit);
    assert_eq!(rig.flower.color, shown);
    assert_eq!(rig.flower.level, 100);
}

#[test]
fn long_press_from_open_lit_keeps_petals_open() {
    let mut rig = Rig::new(&[0]);
    rig.feed(GestureEvent::Release);
    rig.flower.take_calls();

    rig.feed(GestureEvent::LongPress);
    assert_eq!(rig.state(), StateId::OpenRainbow);
    assert_eq!(rig.flower.take_calls(), vec![FlowerCall::StartRainbow]);
}

// ── Remote pairing ────────────────────────────────────────────

#[test]
fn hold_press_enters_pairing_and_touch_cancels() {
    let mut rig = Rig::new(&[0]);

    rig.feed(GestureEvent::PressStart);
    rig.feed(GestureEvent::LongPress);
    assert_eq!(
        rig.feed(GestureEvent::HoldPress),
        Some((StateId::ClosedRainbow, StateId::RemoteInit))
    );
    assert_eq!(
        rig.flower.take_calls(),
        vec![
            FlowerCall::StartRainbow,
            FlowerCall::SetColor {
                color: ATTENTION_BLUE,
                mode: ColorMode::Flash,
                duration_ms: 1000,
            },
        ]
    );
    assert!(rig.adv.active);
    assert_eq!(rig.adv.starts, 1);

    // Release of the hold touch is swallowed.
    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert_eq!(rig.state(), StateId::RemoteInit);

    assert_eq!(
        rig.feed(GestureEvent::PressStart),
        Some((StateId::RemoteInit, StateId::Standby))
    );
    assert!(!rig.adv.active);
    assert_eq!(rig.adv.stops, 1);
    assert_eq!(
        rig.flower.take_calls(),
        vec![FlowerCall::SetColor {
            color: BLACK,
            mode: ColorMode::Transition,
            duration_ms: 500,
        }]
    );

    // The cancel fade is still running when the finger lifts.
    rig.flower.idle = false;
    assert_eq!(rig.feed(GestureEvent::Release), None);
    assert_eq!(rig.state(), StateId::Standby);
}

#[test]
fn hold_press_from_open_lit_is_ignored() {
    let mut rig = Rig::new(&[0]);
    rig.feed(GestureEvent::Release);
    rig.flower.take_calls();

    assert_eq!(rig.feed(GestureEvent::HoldPress), None);
    assert_eq!(rig.state(), StateId::OpenLit);
    assert!(rig.flower.calls.is_empty());
    assert_eq!(rig.adv.starts, 0);
}

#[test]
fn long_press_during_pairing_starts_rainbow_and_keeps_advertising() {
    let mut rig = Rig::new(&[0]);
    rig.feed(GestureEvent::HoldPress);
    rig.feed(GestureEvent::Release);

    rig.feed(GestureEvent::LongPress);
    assert_eq!(rig.state(), StateId::ClosedRainbow);
    assert!(rig.adv.active);
}

// ── Colour picker ─────────────────────────────────────────────

#[test]
fn picker_uses_every_scheme_colour_before_repeating() {
    let mut rig = Rig::new(&[0, 1, 2, 3, 4, 5, 6, 7]);
    let n = rig.scheme.len();
    let mut picked = Vec::new();

    for _ in 0..n {
        rig.feed(GestureEvent::Release);
        picked.push(rig.flower.last_color().unwrap());
        rig.feed(GestureEvent::Release);
        rig.feed(GestureEvent::Release);
        assert_eq!(rig.state(), StateId::Standby);
    }

    for c in color::DEFAULT_SCHEME {
        assert_eq!(picked.iter().filter(|p| **p == c).count(), 1, "{:?}", c);
    }
    assert!(rig.automaton.picker().mask().is_full());

    // Next open starts a fresh cycle.
    rig.feed(GestureEvent::Release);
    assert_eq!(rig.automaton.picker().mask().count(), 1);
}

#[test]
fn takeover_resync_leaves_flower_untouched() {
    let mut rig = Rig::new(&[0]);
    rig.flower.level = 60;
    assert_eq!(
        rig.automaton.on_remote_took_over(&rig.flower),
        Some((StateId::Standby, StateId::OpenLit))
    );
    assert!(rig.flower.calls.is_empty());

    // Subsequent tap closes, as if the user had opened it.
    rig.feed(GestureEvent::Release);
    assert_eq!(rig.state(), StateId::ClosedLit);
}
