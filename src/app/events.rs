//! Outbound application events.
//!
//! The [`FlowerService`](super::service::FlowerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log to serial, count in tests, …).

use crate::drivers::battery::BatteryStatus;
use crate::fsm::StateId;
use crate::remote::RemoteSession;
use crate::remote::protocol::CharacteristicId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The automaton moved between states.
    StateChanged { from: StateId, to: StateId },

    /// A remote peer started driving the flower.
    RemoteTookOver,

    /// The BLE session moved (idle / advertising / connected).
    SessionChanged(RemoteSession),

    /// A validated characteristic write was applied.
    WriteApplied(CharacteristicId),

    /// Battery reading moved.
    BatteryChanged(BatteryStatus),

    /// Pending configuration changes reached flash.
    ConfigSaved,
}
