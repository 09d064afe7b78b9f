//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the flower if the main loop stalls.  The loop calls `feed()`
//! once per iteration; a stuck servo transition or a wedged BLE callback
//! that blocks the loop for longer than the timeout reboots the device.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Default stall budget for the main loop.
pub const DEFAULT_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT API calls from the main task during init.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout)", timeout_ms);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { timeout_ms, subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms timeout, no-op", timeout_ms);
            Self { timeout_ms, feeds: 0 }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog.  Must be called at least once per timeout.
    #[cfg(target_os = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            // SAFETY: resetting the TWDT for the subscribed current task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
    }

    /// Simulation: number of feeds so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
