//! Li-ion battery monitor.
//!
//! The cell voltage is read through a 1:2 divider on ADC1 and mapped
//! linearly from 3.3 V (empty) to 4.2 V (full).  The charger pulls
//! `CHARGE_STATE_GPIO` low while charging.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use serde::{Deserialize, Serialize};

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY_MV: AtomicU16 = AtomicU16::new(4_000);
#[cfg(not(target_os = "espidf"))]
static SIM_CHARGING: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery(millivolts: u16, charging: bool) {
    SIM_BATTERY_MV.store(millivolts, Ordering::Relaxed);
    SIM_CHARGING.store(charging, Ordering::Relaxed);
}

const EMPTY_MV: u32 = 3_300;
const FULL_MV: u32 = 4_200;
const ADC_MAX: u32 = 4_095;
const ADC_REF_MV: u32 = 3_300;
const DIVIDER_RATIO: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Percent (0–100).
    pub level: u8,
    pub charging: bool,
}

/// Percent of charge for a cell voltage, clamped to 0–100.
pub fn level_from_millivolts(millivolts: u16) -> u8 {
    let mv = u32::from(millivolts).clamp(EMPTY_MV, FULL_MV);
    ((mv - EMPTY_MV) * 100 / (FULL_MV - EMPTY_MV)) as u8
}

pub struct BatteryMonitor {
    last: Option<BatteryStatus>,
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatteryMonitor {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn last(&self) -> Option<BatteryStatus> {
        self.last
    }

    /// Fold a new reading in.  Returns the status when it differs from
    /// the previous one.
    pub fn update(&mut self, millivolts: u16, charging: bool) -> Option<BatteryStatus> {
        let status = BatteryStatus {
            level: level_from_millivolts(millivolts),
            charging,
        };
        if self.last == Some(status) {
            return None;
        }
        self.last = Some(status);
        Some(status)
    }

    /// Sample the hardware and fold it in.
    pub fn poll(&mut self) -> Option<BatteryStatus> {
        let (mv, charging) = Self::read_hw();
        self.update(mv, charging)
    }

    #[cfg(target_os = "espidf")]
    fn read_hw() -> (u16, bool) {
        use crate::drivers::hw_init;
        let mv = millivolts_from_adc(hw_init::adc1_read(crate::pins::BATTERY_ADC_CHANNEL));
        let charging = !hw_init::gpio_read(crate::pins::CHARGE_STATE_GPIO);
        (mv, charging)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_hw() -> (u16, bool) {
        (
            SIM_BATTERY_MV.load(Ordering::Relaxed),
            SIM_CHARGING.load(Ordering::Relaxed),
        )
    }
}

/// Millivolts for a raw ADC reading behind the divider.
pub fn millivolts_from_adc(raw: u16) -> u16 {
    (u32::from(raw) * ADC_REF_MV * DIVIDER_RATIO / ADC_MAX) as u16
}
