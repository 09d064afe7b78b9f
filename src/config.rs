//! Device configuration parameters
//!
//! Everything the flower remembers across power cycles: its advertised
//! name, the colour palette, and the personification tuning consumed by
//! the touch classifier and the light driver.  Values can be overridden
//! via NVS or written by a connected BLE peer.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::color::{self, ColorScheme};

/// Maximum BLE-visible device name length in bytes.
pub const MAX_NAME_LEN: usize = 25;

pub type DeviceName = heapless::String<MAX_NAME_LEN>;

/// Small tuning tuple written over BLE and consumed by collaborators
/// outside the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personification {
    /// Touch sensitivity (1 = least sensitive, 100 = most).
    pub touch_threshold: u8,
    /// Opaque behaviour flags, stored as written.
    pub behavior: u8,
    /// Animation speed in 100 ms units (1..=100).
    pub speed: u8,
    /// Upper bound of petal travel (0..=100 %).
    pub max_open_level: u8,
    /// Light brightness scaler (1..=100 %).
    pub color_brightness: u8,
}

impl Default for Personification {
    fn default() -> Self {
        Self {
            touch_threshold: 45,
            behavior: 0,
            speed: 50,           // 5 s
            max_open_level: 100,
            color_brightness: 70,
        }
    }
}

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Advertised BLE name
    pub name: DeviceName,
    /// Palette for the colour picker (1..=16 entries)
    pub color_scheme: ColorScheme,
    /// Touch / animation tuning
    pub personification: Personification,
    /// Stop advertising as soon as a peer connects
    pub stop_advertising_on_connect: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut name = DeviceName::new();
        let _ = name.push_str("Floower");
        Self {
            name,
            color_scheme: color::default_scheme(),
            personification: Personification::default(),
            stop_advertising_on_connect: true,
        }
    }
}

/// Range-check every field.  Used before persisting and after loading.
pub fn validate(cfg: &DeviceConfig) -> Result<(), ConfigError> {
    validate_name(cfg.name.as_str())?;
    if cfg.color_scheme.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "color_scheme must hold at least one colour",
        ));
    }
    validate_personification(&cfg.personification)
}

pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ConfigError::ValidationFailed("name must be 1–25 bytes"));
    }
    if name.chars().any(char::is_control) {
        return Err(ConfigError::ValidationFailed(
            "name must not contain control characters",
        ));
    }
    Ok(())
}

pub fn validate_personification(p: &Personification) -> Result<(), ConfigError> {
    if !(1..=100).contains(&p.touch_threshold) {
        return Err(ConfigError::ValidationFailed("touch_threshold must be 1–100"));
    }
    if !(1..=100).contains(&p.speed) {
        return Err(ConfigError::ValidationFailed("speed must be 1–100"));
    }
    if p.max_open_level > 100 {
        return Err(ConfigError::ValidationFailed("max_open_level must be 0–100"));
    }
    if !(1..=100).contains(&p.color_brightness) {
        return Err(ConfigError::ValidationFailed(
            "color_brightness must be 1–100",
        ));
    }
    Ok(())
}
