//! FlowerService dispatch: queue order, remote writes, persistence.
//!
//! Each test owns a private [`EventQueue`] so tests can run in parallel
//! without sharing the device-wide queue.

use floower::adapters::ble::{ATT_INVALID_ATTR_LEN, ATT_OK, ATT_VALUE_NOT_ALLOWED, BleAdapter, deliver_write};
use floower::adapters::flower::FlowerAdapter;
use floower::app::events::AppEvent;
use floower::app::ports::{ColorMode, FlowerPort};
use floower::app::service::{FlowerService, SAVE_DELAY_MS};
use floower::color::{self, Rgb};
use floower::config::DeviceConfig;
use floower::drivers::battery::BatteryStatus;
use floower::drivers::hw_init::{self, LedcChannel};
use floower::drivers::led::RgbLed;
use floower::drivers::petals::PetalsDriver;
use floower::events::{EVENT_QUEUE_DEPTH, Event, EventQueue};
use floower::fsm::{GestureEvent, StateId};
use floower::remote::RemoteSession;
use floower::remote::protocol::{self, CharacteristicId, MODE_COLOR, MODE_PETALS, MODE_RAINBOW};

use super::mock_hw::{FlowerCall, LogSink, MockFlower, MockNvs, MockRadio, RadioCall, ScriptedRandom};

struct Rig {
    service: FlowerService,
    queue: EventQueue,
    flower: MockFlower,
    radio: MockRadio,
    rng: ScriptedRandom,
    sink: LogSink,
}

impl Rig {
    fn new() -> Self {
        let mut service = FlowerService::new(DeviceConfig::default());
        let mut sink = LogSink::new();
        service.start(&mut sink);
        Self {
            service,
            queue: EventQueue::new(),
            flower: MockFlower::new(),
            radio: MockRadio::new(),
            rng: ScriptedRandom::new(&[1]),
            sink,
        }
    }

    fn push(&self, event: Event) {
        assert!(self.queue.push(event));
    }

    fn write(&self, id: CharacteristicId, raw: &[u8]) {
        assert_eq!(deliver_write(id, raw, &self.queue), ATT_OK);
    }

    fn drain(&mut self) -> usize {
        self.service.drain(
            &self.queue,
            &mut self.flower,
            &mut self.radio,
            &mut self.rng,
            &mut self.sink,
        )
    }

    fn state_changes(&self) -> Vec<(StateId, StateId)> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

// ── Gestures through the queue ────────────────────────────────

#[test]
fn queued_gestures_drive_the_automaton() {
    let mut rig = Rig::new();
    assert_eq!(rig.sink.events, vec![AppEvent::Started(StateId::Standby)]);

    rig.push(Event::Gesture(GestureEvent::PressStart));
    rig.push(Event::Gesture(GestureEvent::Release));
    assert_eq!(rig.drain(), 2);
    assert!(rig.queue.is_empty());

    assert_eq!(rig.service.state(), StateId::OpenLit);
    assert_eq!(rig.state_changes(), vec![(StateId::Standby, StateId::OpenLit)]);
    assert_eq!(rig.flower.last_color(), Some(color::DEFAULT_SCHEME[1]));
}

#[test]
fn hold_press_advertises_through_the_link() {
    let mut rig = Rig::new();
    rig.push(Event::Gesture(GestureEvent::HoldPress));
    rig.drain();

    assert_eq!(rig.service.state(), StateId::RemoteInit);
    assert_eq!(rig.service.remote().session(), RemoteSession::Advertising);
    assert!(rig.radio.advertising);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::SessionChanged(RemoteSession::Advertising)),
        1
    );

    // Release swallowed, next touch cancels pairing.
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.push(Event::Gesture(GestureEvent::PressStart));
    rig.drain();
    assert_eq!(rig.service.state(), StateId::Standby);
    assert_eq!(rig.service.remote().session(), RemoteSession::Idle);
    assert!(!rig.radio.advertising);
}

// ── Remote takeover ───────────────────────────────────────────

#[test]
fn takeover_resync_runs_after_already_queued_events() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.write(CharacteristicId::State, &[0, 0, 0, 0, MODE_PETALS]);
    rig.push(Event::Gesture(GestureEvent::LongPress));
    rig.drain();

    // LongPress ran before the resync, which then found closed petals.
    assert_eq!(
        rig.state_changes(),
        vec![
            (StateId::Standby, StateId::ClosedRainbow),
            (StateId::ClosedRainbow, StateId::Standby),
        ]
    );
    let took_over = rig
        .sink
        .events
        .iter()
        .position(|e| *e == AppEvent::RemoteTookOver)
        .unwrap();
    let rainbow = rig
        .sink
        .events
        .iter()
        .position(|e| {
            *e == AppEvent::StateChanged {
                from: StateId::Standby,
                to: StateId::ClosedRainbow,
            }
        })
        .unwrap();
    assert!(rainbow < took_over);
}

#[test]
fn takeover_with_open_petals_resyncs_to_open_lit() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.write(CharacteristicId::State, &[80, 255, 0, 0, MODE_COLOR | MODE_PETALS, 20]);
    rig.drain();

    assert_eq!(rig.service.state(), StateId::OpenLit);
    assert_eq!(
        rig.flower.take_calls(),
        vec![
            FlowerCall::SetColor {
                color: Rgb::new(255, 0, 0),
                mode: ColorMode::Transition,
                duration_ms: 2000,
            },
            FlowerCall::SetPetals {
                percent: 80,
                duration_ms: 2000,
            },
        ]
    );

    // Local tap continues from the adopted state.
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.drain();
    assert_eq!(rig.service.state(), StateId::ClosedLit);
}

#[test]
fn second_state_write_is_not_a_takeover() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.write(CharacteristicId::State, &[100, 0, 0, 255, MODE_COLOR | MODE_PETALS]);
    rig.write(CharacteristicId::State, &[0, 0, 0, 0, MODE_PETALS]);
    rig.drain();

    assert_eq!(rig.sink.count(|e| *e == AppEvent::RemoteTookOver), 1);
    // Resync ran after both writes: petals are now closing.
    assert_eq!(rig.service.state(), StateId::Standby);
}

#[test]
fn takeover_resyncs_even_when_the_queue_is_full() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.drain();
    for _ in 0..EVENT_QUEUE_DEPTH {
        rig.push(Event::Gesture(GestureEvent::PressStart));
    }

    let write = protocol::decode(CharacteristicId::State, &[100, 1, 2, 3, MODE_PETALS]).unwrap();
    rig.service.dispatch(
        Event::RemoteWrite(write),
        &mut rig.flower,
        &mut rig.radio,
        &mut rig.rng,
        &mut rig.sink,
        &rig.queue,
    );
    assert_eq!(rig.service.state(), StateId::OpenLit);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::RemoteTookOver), 1);

    // Queued touches start nothing from OpenLit, and nothing resyncs twice.
    assert_eq!(rig.drain(), EVENT_QUEUE_DEPTH);
    assert_eq!(rig.service.state(), StateId::OpenLit);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::RemoteTookOver), 1);

    rig.push(Event::Gesture(GestureEvent::Release));
    rig.drain();
    assert_eq!(rig.service.state(), StateId::ClosedLit);
}

#[test]
fn rainbow_mode_write_starts_rainbow() {
    let mut rig = Rig::new();
    rig.write(CharacteristicId::State, &[0, 0, 0, 0, MODE_RAINBOW]);
    rig.drain();
    assert_eq!(rig.flower.take_calls(), vec![FlowerCall::StartRainbow]);
    assert!(rig.flower.rainbow);
}

#[test]
fn remote_rainbow_is_reported_in_state_record() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.write(CharacteristicId::State, &[0, 0, 0, 0, MODE_RAINBOW]);
    rig.drain();

    // The automaton resynced to a non-rainbow state; the flower still cycles.
    assert_eq!(rig.service.state(), StateId::Standby);
    let record = rig.radio.notifications(CharacteristicId::State).pop().unwrap();
    assert_eq!(record[4], MODE_COLOR | MODE_PETALS | MODE_RAINBOW);

    // Leaving the rainbow locally freezes the colour and clears the bit.
    rig.push(Event::Gesture(GestureEvent::LongPress));
    rig.push(Event::Gesture(GestureEvent::PressStart));
    rig.drain();
    assert_eq!(rig.service.state(), StateId::ClosedLit);
    let record = rig.radio.notifications(CharacteristicId::State).pop().unwrap();
    assert_eq!(record[4], MODE_COLOR | MODE_PETALS);
}

#[test]
fn rejected_write_never_reaches_the_service() {
    let rig = Rig::new();
    assert_ne!(
        deliver_write(CharacteristicId::Personification, &[0, 0, 0, 0, 0], &rig.queue),
        ATT_OK
    );
    assert_ne!(deliver_write(CharacteristicId::Name, b"", &rig.queue), ATT_OK);
    assert!(rig.queue.is_empty());
    assert_eq!(rig.service.config(), &DeviceConfig::default());
    assert!(!rig.service.is_config_dirty());
}

// ── Configuration writes ──────────────────────────────────────

#[test]
fn scheme_write_resets_picker_and_dirties_config() {
    let mut rig = Rig::new();
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.drain();
    assert_eq!(rig.service.automaton().picker().mask().count(), 1);

    rig.write(CharacteristicId::ColorScheme, &[10, 20, 30, 40, 50, 60]);
    rig.drain();

    assert_eq!(
        rig.service.config().color_scheme.as_slice(),
        &[Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)]
    );
    assert_eq!(rig.service.automaton().picker().mask().count(), 0);
    assert!(rig.service.is_config_dirty());
    assert_eq!(
        rig.radio.notifications(CharacteristicId::ColorScheme),
        vec![vec![10, 20, 30, 40, 50, 60]]
    );
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::WriteApplied(CharacteristicId::ColorScheme)),
        1
    );

    // Close, shut down, reopen: the pick comes from the new palette.
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.push(Event::Gesture(GestureEvent::Release));
    rig.drain();
    assert_eq!(rig.service.state(), StateId::OpenLit);
    assert_eq!(rig.flower.last_color(), Some(Rgb::new(40, 50, 60)));
}

#[test]
fn name_and_personification_writes_update_config() {
    let mut rig = Rig::new();
    rig.write(CharacteristicId::Name, b"Tulip");
    rig.write(CharacteristicId::Personification, &[30, 1, 20, 80, 50]);
    rig.drain();

    let cfg = rig.service.config();
    assert_eq!(cfg.name.as_str(), "Tulip");
    assert_eq!(cfg.personification.touch_threshold, 30);
    assert_eq!(cfg.personification.speed, 20);
    assert_eq!(cfg.personification.max_open_level, 80);
    assert_eq!(
        rig.radio.notifications(CharacteristicId::Name),
        vec![b"Tulip".to_vec()]
    );

    // Speed now sets the default remote transition time.
    rig.write(CharacteristicId::State, &[50, 0, 0, 0, MODE_PETALS]);
    rig.drain();
    assert_eq!(
        rig.flower.calls.last(),
        Some(&FlowerCall::SetPetals {
            percent: 50,
            duration_ms: 2000,
        })
    );
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn auto_save_after_quiet_period() {
    let mut rig = Rig::new();
    let nvs = MockNvs::new();
    rig.write(CharacteristicId::Name, b"Daisy");
    rig.drain();

    assert!(!rig.service.auto_save_if_needed(&nvs, 10_000, &mut rig.sink));
    assert!(!rig.service.auto_save_if_needed(&nvs, 10_000 + SAVE_DELAY_MS - 1, &mut rig.sink));
    assert!(rig.service.auto_save_if_needed(&nvs, 10_000 + SAVE_DELAY_MS, &mut rig.sink));
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.saved.borrow().as_ref().unwrap().name.as_str(), "Daisy");
    assert_eq!(rig.sink.count(|e| *e == AppEvent::ConfigSaved), 1);

    // Nothing new to write.
    assert!(!rig.service.auto_save_if_needed(&nvs, 60_000, &mut rig.sink));
    assert_eq!(nvs.saves.get(), 1);
}

#[test]
fn failed_save_is_retried() {
    let mut rig = Rig::new();
    let nvs = MockNvs::new();
    nvs.fail.set(true);
    rig.write(CharacteristicId::Personification, &[45, 0, 10, 100, 70]);
    rig.drain();

    rig.service.auto_save_if_needed(&nvs, 0, &mut rig.sink);
    assert!(!rig.service.auto_save_if_needed(&nvs, SAVE_DELAY_MS, &mut rig.sink));
    assert!(rig.service.is_config_dirty());

    nvs.fail.set(false);
    rig.service.auto_save_if_needed(&nvs, SAVE_DELAY_MS + 1, &mut rig.sink);
    assert!(rig.service.auto_save_if_needed(&nvs, 2 * SAVE_DELAY_MS + 1, &mut rig.sink));
    assert!(!rig.service.is_config_dirty());
}

#[test]
fn force_save_skips_clean_config() {
    let mut rig = Rig::new();
    let nvs = MockNvs::new();
    assert!(!rig.service.force_save_if_dirty(&nvs, &mut rig.sink));
    assert_eq!(nvs.saves.get(), 0);
}

// ── Session and battery ───────────────────────────────────────

#[test]
fn connect_publishes_config_then_state() {
    let mut rig = Rig::new();
    rig.push(Event::Gesture(GestureEvent::HoldPress));
    rig.push(Event::RemoteConnected);
    rig.drain();

    assert_eq!(rig.service.remote().session(), RemoteSession::Connected);
    let calls = rig.radio.take_calls();
    let name_at = calls
        .iter()
        .position(|c| matches!(c, RadioCall::Notify(CharacteristicId::Name, _)))
        .unwrap();
    let state_at = calls
        .iter()
        .position(|c| matches!(c, RadioCall::Notify(CharacteristicId::State, _)))
        .unwrap();
    assert!(name_at < state_at);
    assert!(calls.contains(&RadioCall::StopAdvertising));

    rig.push(Event::RemoteDisconnected);
    rig.drain();
    assert_eq!(rig.service.remote().session(), RemoteSession::Idle);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SessionChanged(_))),
        3
    );
}

#[test]
fn state_record_follows_flower() {
    let mut rig = Rig::new();
    rig.push(Event::RemoteConnected);
    rig.drain();
    rig.radio.take_calls();

    rig.push(Event::Gesture(GestureEvent::Release));
    rig.drain();
    let expected = protocol::encode_state(100, color::DEFAULT_SCHEME[1], false);
    assert_eq!(
        rig.radio.notifications(CharacteristicId::State),
        vec![expected.to_vec()]
    );

    // Ignored gesture, nothing new to publish.
    rig.push(Event::Gesture(GestureEvent::PressStart));
    rig.drain();
    assert_eq!(rig.radio.notifications(CharacteristicId::State).len(), 1);
}

#[test]
fn battery_change_is_published_and_logged() {
    let mut rig = Rig::new();
    let status = BatteryStatus {
        level: 64,
        charging: true,
    };
    rig.push(Event::RemoteConnected);
    rig.push(Event::BatteryChanged(status));
    rig.drain();

    assert_eq!(rig.service.remote().battery(), Some(status));
    assert_eq!(
        rig.radio.notifications(CharacteristicId::Battery),
        vec![vec![64, 1]]
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BatteryChanged(status)), 1);
}

// ── Real adapters (host simulation) ───────────────────────────

#[test]
fn tap_cycle_on_simulated_hardware() {
    let petals = PetalsDriver::new(LedcChannel::servo(), 100);
    let led = RgbLed::new(
        LedcChannel::led(hw_init::LEDC_CH_LED_R),
        LedcChannel::led(hw_init::LEDC_CH_LED_G),
        LedcChannel::led(hw_init::LEDC_CH_LED_B),
        100,
    );
    let mut flower = FlowerAdapter::new(petals, led);
    let mut radio = BleAdapter::new(DeviceConfig::default().name, "FL-5F103B");
    let mut rng = ScriptedRandom::new(&[4]);
    let mut sink = LogSink::new();
    let queue = EventQueue::new();
    let mut service = FlowerService::new(DeviceConfig::default());
    service.start(&mut sink);

    queue.push(Event::Gesture(GestureEvent::Release));
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    assert_eq!(service.state(), StateId::OpenLit);

    // Still opening: taps are ignored.
    flower.tick(2_500);
    assert!(flower.petals_moving());
    queue.push(Event::Gesture(GestureEvent::Release));
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    assert_eq!(service.state(), StateId::OpenLit);

    flower.tick(5_000);
    assert!(flower.is_idle());
    assert_eq!(flower.rendered_level(), 100);
    assert_eq!(flower.rendered_color(), color::DEFAULT_SCHEME[4]);

    queue.push(Event::Gesture(GestureEvent::Release));
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    assert_eq!(service.state(), StateId::ClosedLit);
    flower.tick(10_000);

    queue.push(Event::Gesture(GestureEvent::Release));
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    flower.tick(12_000);
    assert_eq!(service.state(), StateId::Standby);
    assert_eq!(flower.rendered_color(), color::BLACK);
    assert_eq!(flower.rendered_level(), 0);
}

#[test]
fn remote_name_write_renames_simulated_radio() {
    let mut flower = MockFlower::new();
    let mut radio = BleAdapter::new(DeviceConfig::default().name, "FL-5F103B");
    let mut rng = ScriptedRandom::new(&[0]);
    let mut sink = LogSink::new();
    let queue = EventQueue::new();
    let mut service = FlowerService::new(DeviceConfig::default());

    assert_eq!(deliver_write(CharacteristicId::Name, b"Lily", &queue), ATT_OK);
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);

    assert_eq!(radio.device_name(), "Lily");
    assert_eq!(radio.sim_value(CharacteristicId::Name), b"Lily");
}

#[test]
fn rejected_scheme_write_keeps_readable_scheme() {
    let mut flower = MockFlower::new();
    let mut radio = BleAdapter::new(DeviceConfig::default().name, "FL-5F103B");
    let mut rng = ScriptedRandom::new(&[0]);
    let mut sink = LogSink::new();
    let queue = EventQueue::new();
    let mut service = FlowerService::new(DeviceConfig::default());

    radio.sim_connect();
    queue.push(Event::RemoteConnected);
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    let before = radio.sim_value(CharacteristicId::ColorScheme).to_vec();
    assert_eq!(
        before,
        protocol::encode_color_scheme(&color::default_scheme()).to_vec()
    );

    assert_eq!(
        deliver_write(CharacteristicId::ColorScheme, &[1, 2], &queue),
        ATT_INVALID_ATTR_LEN
    );
    assert_eq!(
        deliver_write(CharacteristicId::Name, &[0xFF, 0xFE], &queue),
        ATT_VALUE_NOT_ALLOWED
    );
    assert!(queue.is_empty());
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);

    assert_eq!(radio.sim_value(CharacteristicId::ColorScheme), before.as_slice());
    assert_eq!(radio.sim_value(CharacteristicId::Name), b"Floower");
    assert_eq!(service.config().color_scheme, color::default_scheme());
    assert!(!service.is_config_dirty());

    // A whole entry goes through.
    assert_eq!(deliver_write(CharacteristicId::ColorScheme, &[1, 2, 3], &queue), ATT_OK);
    service.drain(&queue, &mut flower, &mut radio, &mut rng, &mut sink);
    assert_eq!(radio.sim_value(CharacteristicId::ColorScheme), &[1, 2, 3]);
}
