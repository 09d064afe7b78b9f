//! Random source adapter for the colour picker.
//!
//! - **`target_os = "espidf"`**: `esp_random()`, the hardware RNG (true
//!   random while the radio is on, pseudo-random otherwise; both are fine
//!   for picking a colour).
//! - **`not(target_os = "espidf")`**: xorshift32 seeded from the std
//!   `RandomState` hasher keys.

use crate::app::ports::RandomSource;

pub struct HwRandom {
    #[cfg(not(target_os = "espidf"))]
    state: u32,
}

impl Default for HwRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl HwRandom {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        use std::hash::{BuildHasher, Hasher};
        let mut h = std::collections::hash_map::RandomState::new().build_hasher();
        h.write_u32(0x464C_5752);
        Self::with_seed(h.finish() as u32)
    }

    /// Simulation: deterministic sequence for reproducible runs.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_seed(seed: u32) -> Self {
        // xorshift never leaves zero
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    #[cfg(target_os = "espidf")]
    fn next_u32(&mut self) -> u32 {
        // SAFETY: esp_random has no preconditions.
        unsafe { esp_idf_svc::sys::esp_random() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl RandomSource for HwRandom {
    fn next_below(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        // Lemire multiply-shift; bias is negligible for palette sizes.
        ((u64::from(self.next_u32()) * bound as u64) >> 32) as usize
    }
}
