//! Remote control link.
//!
//! Session and takeover bookkeeping for the single BLE peer.  The radio
//! itself sits behind [`RadioPort`]; this module decides when to advertise,
//! which writes count as a takeover and when readable values must be pushed.
//!
//! ```text
//!            start_advertising           on_connected
//!   Idle ─────────────────────▶ Advertising ─────────▶ Connected
//!    ▲  ◀───────────────────── │                         │
//!    │      stop_advertising                             │ on_disconnected
//!    └──────────── (not requested) ◀─────────────────────┘
//!                  (requested) ──▶ Advertising
//! ```

pub mod protocol;

use log::{debug, info, warn};

use crate::app::ports::RadioPort;
use crate::config::DeviceConfig;
use crate::drivers::battery::BatteryStatus;
use protocol::{CharacteristicId, RemoteWrite, STATE_LEN};

// ───────────────────────────────────────────────────────────────
// Session state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSession {
    Idle,
    Advertising,
    Connected,
}

/// Result of an accepted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied; the peer was already driving the device (or the write does
    /// not touch device state).
    Applied,
    /// First device-state write of this connection; the automaton must
    /// resynchronise.
    TookOver,
}

// ───────────────────────────────────────────────────────────────
// Link
// ───────────────────────────────────────────────────────────────

pub struct RemoteLink {
    session: RemoteSession,
    advertising_requested: bool,
    stop_advertising_on_connect: bool,
    /// The connected peer has written device state at least once.
    driven_by_peer: bool,
    /// Last device-state record pushed to the peer.
    published_state: Option<[u8; STATE_LEN]>,
    battery: Option<BatteryStatus>,
    published_battery: Option<BatteryStatus>,
}

impl RemoteLink {
    pub fn new(stop_advertising_on_connect: bool) -> Self {
        Self {
            session: RemoteSession::Idle,
            advertising_requested: false,
            stop_advertising_on_connect,
            driven_by_peer: false,
            published_state: None,
            battery: None,
            published_battery: None,
        }
    }

    pub fn session(&self) -> RemoteSession {
        self.session
    }

    pub fn is_connected(&self) -> bool {
        self.session == RemoteSession::Connected
    }

    pub fn is_advertising_requested(&self) -> bool {
        self.advertising_requested
    }

    pub fn is_driven_by_peer(&self) -> bool {
        self.driven_by_peer
    }

    pub fn battery(&self) -> Option<BatteryStatus> {
        self.battery
    }

    // ── Advertising ───────────────────────────────────────────

    /// Become discoverable.  While a peer is connected the request is
    /// remembered and honoured after the peer leaves.
    pub fn start_advertising(&mut self, radio: &mut impl RadioPort) {
        self.advertising_requested = true;
        match self.session {
            RemoteSession::Idle => {
                info!("Remote: advertising");
                radio.start_advertising();
                self.session = RemoteSession::Advertising;
            }
            RemoteSession::Advertising => debug!("Remote: already advertising"),
            RemoteSession::Connected => debug!("Remote: advertising deferred until disconnect"),
        }
    }

    pub fn stop_advertising(&mut self, radio: &mut impl RadioPort) {
        self.advertising_requested = false;
        if self.session == RemoteSession::Advertising {
            info!("Remote: advertising stopped");
            radio.stop_advertising();
            self.session = RemoteSession::Idle;
        }
    }

    // ── Connection lifecycle ──────────────────────────────────

    pub fn on_connected(&mut self, radio: &mut impl RadioPort) {
        if self.session == RemoteSession::Connected {
            warn!("Remote: connect while already connected, ignoring");
            return;
        }
        info!("Remote: peer connected");
        if self.session == RemoteSession::Advertising && self.stop_advertising_on_connect {
            radio.stop_advertising();
            self.advertising_requested = false;
        }
        self.session = RemoteSession::Connected;
        self.driven_by_peer = false;
        self.published_state = None;
        self.published_battery = None;
    }

    pub fn on_disconnected(&mut self, radio: &mut impl RadioPort) {
        if self.session != RemoteSession::Connected {
            debug!("Remote: disconnect without connection, ignoring");
            return;
        }
        self.driven_by_peer = false;
        if self.advertising_requested {
            info!("Remote: peer disconnected, advertising again");
            radio.start_advertising();
            self.session = RemoteSession::Advertising;
        } else {
            info!("Remote: peer disconnected");
            self.session = RemoteSession::Idle;
        }
    }

    // ── Writes ────────────────────────────────────────────────

    /// Record a validated write and classify it.  Decoding happens at the
    /// radio boundary, so a malformed write never gets this far.
    pub fn accept(&mut self, write: &RemoteWrite) -> WriteOutcome {
        match write {
            RemoteWrite::State(_) if !self.driven_by_peer => {
                info!("Remote: peer took over");
                self.driven_by_peer = true;
                WriteOutcome::TookOver
            }
            _ => WriteOutcome::Applied,
        }
    }

    // ── Readable values ───────────────────────────────────────

    /// Push the device-state record if it changed since the last push.
    /// Returns `true` when a notification went out.
    pub fn refresh_state(&mut self, radio: &mut impl RadioPort, record: [u8; STATE_LEN]) -> bool {
        if !self.is_connected() || self.published_state == Some(record) {
            return false;
        }
        radio.notify(CharacteristicId::State, &record);
        self.published_state = Some(record);
        true
    }

    /// Store the battery status and notify the peer when it changed.
    pub fn set_battery(&mut self, radio: &mut impl RadioPort, status: BatteryStatus) -> bool {
        self.battery = Some(status);
        self.publish_battery(radio)
    }

    fn publish_battery(&mut self, radio: &mut impl RadioPort) -> bool {
        let Some(status) = self.battery else {
            return false;
        };
        if !self.is_connected() || self.published_battery == Some(status) {
            return false;
        }
        radio.notify(CharacteristicId::Battery, &protocol::encode_battery(status));
        self.published_battery = Some(status);
        true
    }

    /// Push every configuration-backed value, e.g. right after connecting.
    pub fn publish_config(&mut self, radio: &mut impl RadioPort, config: &DeviceConfig) {
        radio.notify(CharacteristicId::Name, config.name.as_bytes());
        radio.notify(
            CharacteristicId::ColorScheme,
            &protocol::encode_color_scheme(&config.color_scheme),
        );
        radio.notify(
            CharacteristicId::Personification,
            &protocol::encode_personification(&config.personification),
        );
        self.publish_battery(radio);
    }
}
