//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FlowerService (domain)
//! ```
//!
//! Driven adapters (flower actuators, BLE radio, RNG, event sinks, storage)
//! implement these traits.  The [`FlowerService`](super::service::FlowerService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Every actuator method is fire-and-forget: it starts a timed transition
//! and returns immediately.  Completion is observed only by polling
//! [`FlowerPort::is_idle`].

use crate::color::Rgb;
use crate::config::DeviceConfig;
use crate::remote::protocol::CharacteristicId;

// ───────────────────────────────────────────────────────────────
// Flower port (driven adapter: domain → petals + light)
// ───────────────────────────────────────────────────────────────

/// How a colour change is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Jump to the colour.
    Immediate,
    /// Fade from the current colour over the duration.
    Transition,
    /// Show the colour, then fade back to the previous one over the duration.
    Flash,
}

/// Write-side and feedback port for the physical flower.
pub trait FlowerPort {
    /// Start a colour change.  Supersedes any in-flight colour transition.
    fn set_color(&mut self, color: Rgb, mode: ColorMode, duration_ms: u32);

    /// Move the petals to `percent` (0–100).  Supersedes any in-flight
    /// petal motion.
    fn set_petals_open_level(&mut self, percent: u8, duration_ms: u32);

    /// Begin the continuous hue sweep.
    fn start_rainbow(&mut self);

    /// Stop the hue sweep, holding the last rendered colour.
    fn stop_rainbow_retain_color(&mut self);

    /// No colour or petal transition in flight.
    fn is_idle(&self) -> bool;

    /// Light is currently on (non-black).
    fn is_lit(&self) -> bool;

    /// The hue sweep is running.
    fn is_rainbow(&self) -> bool;

    /// Current (or target, while moving) petal level in percent.
    fn petals_open_level(&self) -> u8;

    /// Current (or target, while fading) colour.
    fn color(&self) -> Rgb;
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// What the remote link needs from the BLE stack.
pub trait RadioPort {
    /// Make the device discoverable and connectable.
    fn start_advertising(&mut self);

    /// Stop advertising.  An established connection is kept.
    fn stop_advertising(&mut self);

    /// Push a new characteristic value to the subscribed peer.
    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]);
}

/// Advertising control as seen by the automaton.  The service binds it to
/// the remote link so the session state follows the radio.
pub trait AdvertisingPort {
    fn start_advertising(&mut self);
    fn stop_advertising(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Random source
// ───────────────────────────────────────────────────────────────

/// Uniform random indices for the colour picker.
pub trait RandomSource {
    /// Uniform value in `0..bound`.  `bound` is never zero.
    fn next_below(&mut self, bound: usize) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate before persisting; invalid values are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
