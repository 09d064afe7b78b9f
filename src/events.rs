//! Event queue between callback contexts and the dispatcher.
//!
//! Events are produced by:
//! - the touch classifier (gestures, sampled from the main loop)
//! - Bluedroid GATTS callbacks (connect, disconnect, decoded writes)
//! - the battery monitor
//! - the dispatcher itself (takeover resync, queued behind pending events)
//!
//! Events are consumed by [`FlowerService`](crate::app::service::FlowerService)
//! one at a time, in FIFO order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Touch       │────▶│              │     │              │
//! │ GATTS cb    │────▶│  Event Queue │────▶│  Dispatcher  │
//! │ Battery     │────▶│  (bounded)   │     │  (consumer)  │
//! │ Dispatcher  │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use crate::drivers::battery::BatteryStatus;
use crate::fsm::GestureEvent;
use crate::remote::protocol::RemoteWrite;

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// The closed set of things that can happen to the flower.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // ── User input ────────────────────────────────────────
    /// Classified touch gesture.
    Gesture(GestureEvent),

    // ── Remote link ───────────────────────────────────────
    /// A peer connected.
    RemoteConnected,
    /// The peer went away.
    RemoteDisconnected,
    /// A characteristic write that already passed validation.
    RemoteWrite(RemoteWrite),
    /// The peer started driving the device; resync the automaton.
    RemoteTookOver,

    // ── Power ─────────────────────────────────────────────
    /// Battery level or charger state moved.
    BatteryChanged(BatteryStatus),
}

/// Bounded MPMC queue of [`Event`]s.
///
/// Producers never block: a full queue drops the new event and logs a
/// warning.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue an event.  Returns `false` if the queue was full.
    pub fn push(&self, event: Event) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!("Event queue full, dropping {:?}", dropped);
                false
            }
        }
    }

    /// Dequeue the oldest event.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Discard everything pending.
    pub fn clear(&self) {
        self.channel.clear();
    }
}

/// Queue shared by every producer on the device.
pub static EVENTS: EventQueue = EventQueue::new();

/// Push into the global queue.  Safe from any task context.
pub fn push_event(event: Event) -> bool {
    EVENTS.push(event)
}
