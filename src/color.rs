//! Colour primitives shared by the automaton, the remote protocol and the
//! light driver.

use serde::{Deserialize, Serialize};

/// Upper bound on palette entries.  Sizes the scheme buffer, the
/// used-colour set and the color-scheme characteristic.
pub const MAX_COLOR_SCHEME_SIZE: usize = 16;

/// An 8-bit-per-channel RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True when every channel is zero (light off).
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Linear interpolation towards `to`; `t` is in per-mille (0..=1000).
    pub fn lerp(self, to: Rgb, t_permille: u16) -> Rgb {
        let t = t_permille.min(1000) as i32;
        let mix = |a: u8, b: u8| -> u8 {
            let a = a as i32;
            let b = b as i32;
            (a + (b - a) * t / 1000) as u8
        };
        Rgb::new(mix(self.r, to.r), mix(self.g, to.g), mix(self.b, to.b))
    }

    /// Fully saturated colour on the hue wheel, `hue` in degrees (0..360).
    pub fn from_hue(hue: u16) -> Rgb {
        let hue = hue % 360;
        let sector = hue / 60;
        let offset = ((hue % 60) as u32 * 255 / 60) as u8;
        match sector {
            0 => Rgb::new(255, offset, 0),
            1 => Rgb::new(255 - offset, 255, 0),
            2 => Rgb::new(0, 255, offset),
            3 => Rgb::new(0, 255 - offset, 255),
            4 => Rgb::new(offset, 0, 255),
            _ => Rgb::new(255, 0, 255 - offset),
        }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(raw: [u8; 3]) -> Self {
        Rgb::new(raw[0], raw[1], raw[2])
    }
}

/// Ordered, bounded palette the colour picker draws from.
pub type ColorScheme = heapless::Vec<Rgb, MAX_COLOR_SCHEME_SIZE>;

// ── Well-known colours ────────────────────────────────────────

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const WHITE: Rgb = Rgb::new(255, 255, 255);
/// Flashed when the flower enters remote-pairing mode.
pub const ATTENTION_BLUE: Rgb = Rgb::new(0, 0, 255);

/// Factory palette.
pub const DEFAULT_SCHEME: [Rgb; 8] = [
    Rgb::new(255, 0, 5),     // red
    Rgb::new(255, 60, 0),    // orange
    Rgb::new(255, 160, 0),   // yellow
    Rgb::new(0, 220, 30),    // green
    Rgb::new(0, 200, 255),   // cyan
    Rgb::new(0, 10, 255),    // blue
    Rgb::new(150, 0, 255),   // violet
    Rgb::new(255, 0, 120),   // pink
];

pub fn default_scheme() -> ColorScheme {
    DEFAULT_SCHEME.iter().copied().collect()
}
