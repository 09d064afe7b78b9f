//! Wire format of the Floower GATT service.
//!
//! ## GATT Service Layout
//!
//! | Characteristic    | UUID                              | Format                          | Perms             |
//! |-------------------|-----------------------------------|---------------------------------|-------------------|
//! | Device state      | `28e17913-…-86b5242f4c01`         | `[open%, R, G, B, mode, (dur)]` | Read+Write+Notify |
//! | Name              | `28e17913-…-86b5242f4c02`         | UTF-8, 1–25 bytes               | Read+Write        |
//! | Color scheme      | `28e17913-…-86b5242f4c03`         | `[R, G, B]*`, 1–16 entries      | Read+Write        |
//! | Personification   | `28e17913-…-86b5242f4c04`         | 5 bytes                         | Read+Write        |
//! | Battery level     | `0x2A19` (service `0x180F`)       | `[level%, charging]`            | Read+Notify       |
//! | Model number      | `0x2A24` (service `0x180A`)       | UTF-8                           | Read              |
//! | Serial number     | `0x2A25` (service `0x180A`)       | UTF-8                           | Read              |
//! | Firmware revision | `0x2A26` (service `0x180A`)       | UTF-8                           | Read              |
//!
//! Every decoder is total: arbitrary input yields either a fully validated
//! [`RemoteWrite`] or a [`WriteError`], never a partially applied value.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::color::{ColorScheme, Rgb, MAX_COLOR_SCHEME_SIZE};
use crate::config::{self, DeviceName, Personification, MAX_NAME_LEN};
use crate::drivers::battery::BatteryStatus;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x28e17913_66c1_475f_a76e_86b5242f4c00;
pub const CHAR_STATE: u128 = 0x28e17913_66c1_475f_a76e_86b5242f4c01;
pub const CHAR_NAME: u128 = 0x28e17913_66c1_475f_a76e_86b5242f4c02;
pub const CHAR_COLOR_SCHEME: u128 = 0x28e17913_66c1_475f_a76e_86b5242f4c03;
pub const CHAR_PERSONIFICATION: u128 = 0x28e17913_66c1_475f_a76e_86b5242f4c04;

pub const BATTERY_SERVICE_UUID: u16 = 0x180F;
pub const CHAR_BATTERY_LEVEL: u16 = 0x2A19;
pub const DEVICE_INFO_SERVICE_UUID: u16 = 0x180A;
pub const CHAR_MODEL_NUMBER: u16 = 0x2A24;
pub const CHAR_SERIAL_NUMBER: u16 = 0x2A25;
pub const CHAR_FIRMWARE_REVISION: u16 = 0x2A26;

pub const MODEL_NUMBER: &str = "Floower";
pub const FIRMWARE_REVISION: &str = env!("CARGO_PKG_VERSION");

/// Length of the device-state record.
pub const STATE_LEN: usize = 5;
/// Device-state write with the optional duration byte.
pub const STATE_WITH_DURATION_LEN: usize = 6;
/// Length of the personification record.
pub const PERSONIFICATION_LEN: usize = 5;
/// Largest color-scheme value.
pub const MAX_SCHEME_BYTES: usize = MAX_COLOR_SCHEME_SIZE * 3;

/// Duration byte unit.
const DURATION_UNIT_MS: u32 = 100;

// ── State mode bits ───────────────────────────────────────────
pub const MODE_COLOR: u8 = 0b001;
pub const MODE_PETALS: u8 = 0b010;
pub const MODE_RAINBOW: u8 = 0b100;
const MODE_MASK: u8 = MODE_COLOR | MODE_PETALS | MODE_RAINBOW;

// ───────────────────────────────────────────────────────────────
// Characteristic identity
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicId {
    State,
    Name,
    ColorScheme,
    Personification,
    Battery,
    ModelNumber,
    SerialNumber,
    FirmwareRevision,
}

impl CharacteristicId {
    pub const ALL: [CharacteristicId; 8] = [
        Self::State,
        Self::Name,
        Self::ColorScheme,
        Self::Personification,
        Self::Battery,
        Self::ModelNumber,
        Self::SerialNumber,
        Self::FirmwareRevision,
    ];

    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::State | Self::Name | Self::ColorScheme | Self::Personification
        )
    }

    pub fn is_notifiable(self) -> bool {
        matches!(self, Self::State | Self::Battery)
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Why a characteristic write was refused.  The committed value is
/// unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    InvalidLength,
    OutOfRange(&'static str),
    InvalidUtf8,
    ReadOnly,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength => write!(f, "invalid value length"),
            Self::OutOfRange(field) => write!(f, "{} out of range", field),
            Self::InvalidUtf8 => write!(f, "value is not valid UTF-8"),
            Self::ReadOnly => write!(f, "characteristic is read-only"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Decoded values
// ───────────────────────────────────────────────────────────────

/// Which parts of a device-state write take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMode(u8);

impl StateMode {
    pub fn from_bits(bits: u8) -> Result<Self, WriteError> {
        if bits & !MODE_MASK != 0 || bits == 0 {
            return Err(WriteError::OutOfRange("mode"));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn color(self) -> bool {
        self.0 & MODE_COLOR != 0
    }

    pub fn petals(self) -> bool {
        self.0 & MODE_PETALS != 0
    }

    pub fn rainbow(self) -> bool {
        self.0 & MODE_RAINBOW != 0
    }
}

/// A validated device-state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePacket {
    pub open_level: u8,
    pub color: Rgb,
    pub mode: StateMode,
    /// Explicit transition time; `None` means the personification speed.
    pub duration_ms: Option<u32>,
}

/// A fully validated write, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteWrite {
    State(StatePacket),
    Name(DeviceName),
    ColorScheme(ColorScheme),
    Personification(Personification),
}

impl RemoteWrite {
    pub fn characteristic(&self) -> CharacteristicId {
        match self {
            Self::State(_) => CharacteristicId::State,
            Self::Name(_) => CharacteristicId::Name,
            Self::ColorScheme(_) => CharacteristicId::ColorScheme,
            Self::Personification(_) => CharacteristicId::Personification,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Decoders
// ───────────────────────────────────────────────────────────────

/// Decode and validate a write to `characteristic`.
pub fn decode(characteristic: CharacteristicId, raw: &[u8]) -> Result<RemoteWrite, WriteError> {
    match characteristic {
        CharacteristicId::State => decode_state(raw).map(RemoteWrite::State),
        CharacteristicId::Name => decode_name(raw).map(RemoteWrite::Name),
        CharacteristicId::ColorScheme => decode_color_scheme(raw).map(RemoteWrite::ColorScheme),
        CharacteristicId::Personification => {
            decode_personification(raw).map(RemoteWrite::Personification)
        }
        CharacteristicId::Battery
        | CharacteristicId::ModelNumber
        | CharacteristicId::SerialNumber
        | CharacteristicId::FirmwareRevision => Err(WriteError::ReadOnly),
    }
}

pub fn decode_state(raw: &[u8]) -> Result<StatePacket, WriteError> {
    if raw.len() != STATE_LEN && raw.len() != STATE_WITH_DURATION_LEN {
        return Err(WriteError::InvalidLength);
    }
    let open_level = raw[0];
    if open_level > 100 {
        return Err(WriteError::OutOfRange("open level"));
    }
    let mode = StateMode::from_bits(raw[4])?;
    let duration_ms = raw.get(5).map(|d| u32::from(*d) * DURATION_UNIT_MS);
    Ok(StatePacket {
        open_level,
        color: Rgb::new(raw[1], raw[2], raw[3]),
        mode,
        duration_ms,
    })
}

pub fn decode_name(raw: &[u8]) -> Result<DeviceName, WriteError> {
    if raw.is_empty() || raw.len() > MAX_NAME_LEN {
        return Err(WriteError::InvalidLength);
    }
    let s = core::str::from_utf8(raw).map_err(|_| WriteError::InvalidUtf8)?;
    config::validate_name(s).map_err(|_| WriteError::OutOfRange("name"))?;
    let mut name = DeviceName::new();
    name.push_str(s).map_err(|_| WriteError::InvalidLength)?;
    Ok(name)
}

pub fn decode_color_scheme(raw: &[u8]) -> Result<ColorScheme, WriteError> {
    if raw.is_empty() || raw.len() % 3 != 0 || raw.len() > MAX_SCHEME_BYTES {
        return Err(WriteError::InvalidLength);
    }
    let mut scheme = ColorScheme::new();
    for rgb in raw.chunks_exact(3) {
        scheme
            .push(Rgb::new(rgb[0], rgb[1], rgb[2]))
            .map_err(|_| WriteError::InvalidLength)?;
    }
    Ok(scheme)
}

pub fn decode_personification(raw: &[u8]) -> Result<Personification, WriteError> {
    let [touch_threshold, behavior, speed, max_open_level, color_brightness] = raw else {
        return Err(WriteError::InvalidLength);
    };
    let p = Personification {
        touch_threshold: *touch_threshold,
        behavior: *behavior,
        speed: *speed,
        max_open_level: *max_open_level,
        color_brightness: *color_brightness,
    };
    config::validate_personification(&p).map_err(|e| match e {
        ConfigError::ValidationFailed(field) => WriteError::OutOfRange(field),
        _ => WriteError::OutOfRange("personification"),
    })?;
    Ok(p)
}

// ───────────────────────────────────────────────────────────────
// Encoders (readable values)
// ───────────────────────────────────────────────────────────────

/// Readable device-state record.  Mode reports colour and petals, plus
/// the rainbow bit while colour cycling runs.
pub fn encode_state(open_level: u8, color: Rgb, rainbow: bool) -> [u8; STATE_LEN] {
    let mut mode = MODE_COLOR | MODE_PETALS;
    if rainbow {
        mode |= MODE_RAINBOW;
    }
    [open_level.min(100), color.r, color.g, color.b, mode]
}

pub fn encode_color_scheme(scheme: &[Rgb]) -> heapless::Vec<u8, MAX_SCHEME_BYTES> {
    let mut out = heapless::Vec::new();
    for c in scheme.iter().take(MAX_COLOR_SCHEME_SIZE) {
        let _ = out.extend_from_slice(&[c.r, c.g, c.b]);
    }
    out
}

pub fn encode_personification(p: &Personification) -> [u8; PERSONIFICATION_LEN] {
    [
        p.touch_threshold,
        p.behavior,
        p.speed,
        p.max_open_level,
        p.color_brightness,
    ]
}

pub fn encode_battery(status: BatteryStatus) -> [u8; 2] {
    [status.level.min(100), u8::from(status.charging)]
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
