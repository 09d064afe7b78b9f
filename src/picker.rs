//! Palette colour picker.
//!
//! Picks a pseudo-random palette entry while avoiding entries already used
//! in the current cycle.  The avoidance is best-effort: after `3 × N`
//! misses the last draw is accepted, so a repeat inside a cycle is rare but
//! possible.

use log::debug;

use crate::app::ports::RandomSource;
use crate::color::{self, Rgb, MAX_COLOR_SCHEME_SIZE};

/// Retry budget multiplier (draws per palette entry).
const RETRIES_PER_ENTRY: usize = 3;

/// Set of palette indices chosen since the last full cycle, sized to the
/// palette length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedColorMask {
    used: [bool; MAX_COLOR_SCHEME_SIZE],
    len: usize,
}

impl UsedColorMask {
    pub fn new(len: usize) -> Self {
        Self {
            used: [false; MAX_COLOR_SCHEME_SIZE],
            len: len.min(MAX_COLOR_SCHEME_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.used[..self.len].iter().all(|u| !u)
    }

    pub fn is_full(&self) -> bool {
        self.len > 0 && self.used[..self.len].iter().all(|u| *u)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.len && self.used[index]
    }

    pub fn insert(&mut self, index: usize) {
        if index < self.len {
            self.used[index] = true;
        }
    }

    pub fn clear(&mut self) {
        self.used = [false; MAX_COLOR_SCHEME_SIZE];
    }

    /// Number of indices marked used.
    pub fn count(&self) -> usize {
        self.used[..self.len].iter().filter(|u| **u).count()
    }
}

/// Stateful picker owning the used-colour mask.
#[derive(Debug, Clone)]
pub struct ColorPicker {
    mask: UsedColorMask,
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPicker {
    pub fn new() -> Self {
        Self {
            mask: UsedColorMask::new(0),
        }
    }

    pub fn mask(&self) -> &UsedColorMask {
        &self.mask
    }

    /// Forget the current cycle (e.g. after the palette was replaced).
    pub fn reset(&mut self) {
        self.mask.clear();
    }

    /// Pick the next colour from `scheme`.
    pub fn next_color(&mut self, scheme: &[Rgb], rng: &mut impl RandomSource) -> Rgb {
        let n = scheme.len().min(MAX_COLOR_SCHEME_SIZE);
        if n == 0 {
            return color::WHITE;
        }
        if self.mask.len() != n {
            self.mask = UsedColorMask::new(n);
        }
        if self.mask.is_full() {
            debug!("ColorPicker: palette exhausted, starting new cycle");
            self.mask.clear();
        }

        let mut index = rng.next_below(n) % n;
        let mut attempts = 1;
        while self.mask.contains(index) && attempts < RETRIES_PER_ENTRY * n {
            index = rng.next_below(n) % n;
            attempts += 1;
        }

        self.mask.insert(index);
        scheme[index]
    }
}
