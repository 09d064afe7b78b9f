//! Capacitive touch gesture classifier.
//!
//! ## Hardware
//!
//! The touch leaf is an ESP32 touch pad.  A raw reading *below* the
//! configured threshold means a finger is on the leaf.  The main loop
//! samples the pad every tick and feeds the level into [`TouchClassifier`],
//! which debounces it and runs the gesture state machine.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                         | Event        |
//! |-------------|-----------------------------------|--------------|
//! | Press       | Touched for >= 50 ms              | `PressStart` |
//! | Long press  | Still touched after 1.5 s         | `LongPress`  |
//! | Hold        | Still touched after 5 s           | `HoldPress`  |
//! | Release     | Finger lifted after `PressStart`  | `Release`    |
//!
//! At most one event is produced per tick.

use crate::fsm::GestureEvent;

const DEBOUNCE_MS: u32 = 50;
pub const LONG_PRESS_MS: u32 = 1_500;
pub const HOLD_PRESS_MS: u32 = 5_000;

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    LongPressed { since_ms: u32 },
    Held,
}

pub struct TouchClassifier {
    threshold: u16,
    state: TouchState,
}

impl TouchClassifier {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: u16::from(threshold),
            state: TouchState::Idle,
        }
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = u16::from(threshold);
    }

    /// A raw pad reading below the threshold counts as touched.
    pub fn is_touched(&self, raw: u16) -> bool {
        raw < self.threshold
    }

    /// Classify a raw pad reading.
    pub fn sample(&mut self, now_ms: u32, raw: u16) -> Option<GestureEvent> {
        let touched = self.is_touched(raw);
        self.tick(now_ms, touched)
    }

    /// Call from the main loop at each tick with the current touch level.
    /// Returns a classified gesture event, if any.
    pub fn tick(&mut self, now_ms: u32, touched: bool) -> Option<GestureEvent> {
        match self.state {
            TouchState::Idle => {
                if touched {
                    self.state = TouchState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            TouchState::DebounceWait { since_ms } => {
                if !touched {
                    self.state = TouchState::Idle;
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = TouchState::Pressed { since_ms };
                    return Some(GestureEvent::PressStart);
                }
                None
            }

            TouchState::Pressed { since_ms } => {
                if !touched {
                    self.state = TouchState::Idle;
                    return Some(GestureEvent::Release);
                }
                if now_ms.wrapping_sub(since_ms) >= LONG_PRESS_MS {
                    self.state = TouchState::LongPressed { since_ms };
                    return Some(GestureEvent::LongPress);
                }
                None
            }

            TouchState::LongPressed { since_ms } => {
                if !touched {
                    self.state = TouchState::Idle;
                    return Some(GestureEvent::Release);
                }
                if now_ms.wrapping_sub(since_ms) >= HOLD_PRESS_MS {
                    self.state = TouchState::Held;
                    return Some(GestureEvent::HoldPress);
                }
                None
            }

            TouchState::Held => {
                if !touched {
                    self.state = TouchState::Idle;
                    return Some(GestureEvent::Release);
                }
                None
            }
        }
    }

    /// Read the touch pad.
    #[cfg(target_os = "espidf")]
    pub fn read_pad() -> u16 {
        crate::drivers::hw_init::touch_read(crate::pins::TOUCH_PAD)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_pad() -> u16 {
        u16::MAX
    }
}
