//! Flower service, the hexagonal core.
//!
//! [`FlowerService`] owns the gesture automaton, the remote link and the
//! live configuration.  It is the single consumer of the event queue and
//! therefore the only writer of automaton state, the suppress latch, the
//! used-colour mask and the link session.  All I/O flows through port
//! traits injected at call sites.
//!
//! ```text
//!  EventQueue ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │      FlowerService       │
//!  FlowerPort ◀──│  Automaton · RemoteLink  │──▶ RadioPort
//!                 └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::events::{Event, EventQueue};
use crate::fsm::{Automaton, GestureEvent, StateId};
use crate::remote::protocol::{self, CharacteristicId, RemoteWrite, StatePacket};
use crate::remote::{RemoteLink, WriteOutcome};

use super::events::AppEvent;
use super::ports::{AdvertisingPort, ColorMode, ConfigPort, EventSink, FlowerPort, RadioPort, RandomSource};

/// Quiet period after the last configuration change before it is flushed.
pub const SAVE_DELAY_MS: u32 = 2_000;

/// Speed units (personification) to milliseconds.
const SPEED_UNIT_MS: u32 = 100;

// ───────────────────────────────────────────────────────────────
// Advertising binding
// ───────────────────────────────────────────────────────────────

/// Routes the automaton's advertising requests through the remote link so
/// the session state follows the radio.
struct LinkedRadio<'a, R: RadioPort> {
    link: &'a mut RemoteLink,
    radio: &'a mut R,
}

impl<R: RadioPort> AdvertisingPort for LinkedRadio<'_, R> {
    fn start_advertising(&mut self) {
        self.link.start_advertising(self.radio);
    }

    fn stop_advertising(&mut self) {
        self.link.stop_advertising(self.radio);
    }
}

// ───────────────────────────────────────────────────────────────
// FlowerService
// ───────────────────────────────────────────────────────────────

pub struct FlowerService {
    automaton: Automaton,
    remote: RemoteLink,
    config: DeviceConfig,
    config_dirty: bool,
    /// First save check after the latest change; `None` until checked.
    dirty_since_ms: Option<u32>,
}

impl FlowerService {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            automaton: Automaton::new(),
            remote: RemoteLink::new(config.stop_advertising_on_connect),
            config,
            config_dirty: false,
            dirty_since_ms: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let state = self.automaton.current_state();
        sink.emit(&AppEvent::Started(state));
        info!("FlowerService started in {:?} as '{}'", state, self.config.name);
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Drain the queue, dispatching every event in FIFO order and
    /// refreshing the readable device state after each one.
    /// Returns the number of events handled.
    pub fn drain(
        &mut self,
        queue: &EventQueue,
        flower: &mut impl FlowerPort,
        radio: &mut impl RadioPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut handled = 0;
        while let Some(event) = queue.pop() {
            self.dispatch(event, flower, radio, rng, sink, queue);
            self.refresh_state(flower, radio);
            handled += 1;
        }
        handled
    }

    /// Handle one event.
    pub fn dispatch(
        &mut self,
        event: Event,
        flower: &mut impl FlowerPort,
        radio: &mut impl RadioPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
        queue: &EventQueue,
    ) {
        let session_before = self.remote.session();

        match event {
            Event::Gesture(gesture) => self.on_gesture(gesture, flower, radio, rng, sink),
            Event::RemoteConnected => {
                self.remote.on_connected(radio);
                self.remote.publish_config(radio, &self.config);
            }
            Event::RemoteDisconnected => self.remote.on_disconnected(radio),
            Event::RemoteWrite(write) => self.apply_write(write, flower, radio, sink, queue),
            Event::RemoteTookOver => self.resync_after_takeover(flower, sink),
            Event::BatteryChanged(status) => {
                self.remote.set_battery(radio, status);
                sink.emit(&AppEvent::BatteryChanged(status));
            }
        }

        let session_after = self.remote.session();
        if session_after != session_before {
            sink.emit(&AppEvent::SessionChanged(session_after));
        }
    }

    /// Push the device-state record to the peer if it changed.
    pub fn refresh_state(&mut self, flower: &impl FlowerPort, radio: &mut impl RadioPort) -> bool {
        let record = protocol::encode_state(
            flower.petals_open_level(),
            flower.color(),
            flower.is_rainbow(),
        );
        self.remote.refresh_state(radio, record)
    }

    fn on_gesture(
        &mut self,
        gesture: GestureEvent,
        flower: &mut impl FlowerPort,
        radio: &mut impl RadioPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
    ) {
        let mut advertising = LinkedRadio {
            link: &mut self.remote,
            radio,
        };
        let changed = self.automaton.on_gesture(
            gesture,
            flower,
            &mut advertising,
            rng,
            &self.config.color_scheme,
        );
        if let Some((from, to)) = changed {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }

    fn apply_write(
        &mut self,
        write: RemoteWrite,
        flower: &mut impl FlowerPort,
        radio: &mut impl RadioPort,
        sink: &mut impl EventSink,
        queue: &EventQueue,
    ) {
        let characteristic = write.characteristic();
        let outcome = self.remote.accept(&write);

        match write {
            RemoteWrite::State(packet) => self.apply_state(&packet, flower),
            RemoteWrite::Name(name) => {
                info!("Name changed to '{}'", name);
                radio.notify(CharacteristicId::Name, name.as_bytes());
                self.config.name = name;
                self.mark_config_dirty();
            }
            RemoteWrite::ColorScheme(scheme) => {
                info!("Color scheme replaced ({} colours)", scheme.len());
                radio.notify(
                    CharacteristicId::ColorScheme,
                    &protocol::encode_color_scheme(&scheme),
                );
                self.config.color_scheme = scheme;
                self.automaton.picker_mut().reset();
                self.mark_config_dirty();
            }
            RemoteWrite::Personification(p) => {
                debug!("Personification updated: {:?}", p);
                radio.notify(
                    CharacteristicId::Personification,
                    &protocol::encode_personification(&p),
                );
                self.config.personification = p;
                self.mark_config_dirty();
            }
        }
        sink.emit(&AppEvent::WriteApplied(characteristic));

        // Resync runs after everything already queued.  With no room left
        // it runs now: the latch is already set and no later write of this
        // connection would trigger it again.
        if outcome == WriteOutcome::TookOver && !queue.push(Event::RemoteTookOver) {
            warn!("Queue full, resyncing takeover immediately");
            self.resync_after_takeover(flower, sink);
        }
    }

    fn resync_after_takeover(&mut self, flower: &impl FlowerPort, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::RemoteTookOver);
        if let Some((from, to)) = self.automaton.on_remote_took_over(flower) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }

    fn apply_state(&self, packet: &StatePacket, flower: &mut impl FlowerPort) {
        let duration_ms = packet
            .duration_ms
            .unwrap_or(u32::from(self.config.personification.speed) * SPEED_UNIT_MS);

        if packet.mode.rainbow() {
            flower.start_rainbow();
        } else if packet.mode.color() {
            flower.set_color(packet.color, ColorMode::Transition, duration_ms);
        }
        if packet.mode.petals() {
            flower.set_petals_open_level(packet.open_level, duration_ms);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.automaton.current_state()
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn remote(&self) -> &RemoteLink {
        &self.remote
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    // ── Config dirty-flag management ──────────────────────────

    pub fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
        self.dirty_since_ms = None;
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    /// Persist once the configuration has been quiet for
    /// [`SAVE_DELAY_MS`].  Returns `true` if the config was saved.
    pub fn auto_save_if_needed(
        &mut self,
        storage: &impl ConfigPort,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.config_dirty {
            return false;
        }
        let since = *self.dirty_since_ms.get_or_insert(now_ms);
        if now_ms.wrapping_sub(since) < SAVE_DELAY_MS {
            return false;
        }
        self.save(storage, sink)
    }

    /// Save immediately if anything changed.
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort, sink: &mut impl EventSink) -> bool {
        self.config_dirty && self.save(storage, sink)
    }

    fn save(&mut self, storage: &impl ConfigPort, sink: &mut impl EventSink) -> bool {
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                self.dirty_since_ms = None;
                info!("Config saved to NVS");
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                // Retry after another quiet period.
                self.dirty_since_ms = None;
                false
            }
        }
    }
}
