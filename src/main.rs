//! Floower Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single event-driven main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FlowerAdapter    BleAdapter    LogEventSink   NvsAdapter      │
//! │  (FlowerPort)     (RadioPort)   (EventSink)    (ConfigPort)    │
//! │  HwRandom         Esp32TimeAdapter                             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           FlowerService (pure logic)                   │    │
//! │  │  Automaton · ColorPicker · RemoteLink                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TouchClassifier · BatteryMonitor ──push_event──▶ EVENTS       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use floower::adapters::ble::BleAdapter;
use floower::adapters::device_id;
use floower::adapters::flower::FlowerAdapter;
use floower::adapters::log_sink::{LogEventSink, banner};
use floower::adapters::nvs::NvsAdapter;
use floower::adapters::random::HwRandom;
use floower::adapters::time::Esp32TimeAdapter;
use floower::app::service::FlowerService;
use floower::config::{DeviceConfig, Personification};
use floower::drivers::battery::BatteryMonitor;
use floower::drivers::hw_init::{self, LedcChannel};
use floower::drivers::led::RgbLed;
use floower::drivers::petals::PetalsDriver;
use floower::drivers::touch::TouchClassifier;
use floower::drivers::watchdog::{self, Watchdog};
use floower::events::{EVENTS, Event, push_event};
use floower::pins;

/// Main loop period.  Touch debouncing and animation smoothness both
/// depend on it.
const LOOP_PERIOD_MS: u64 = 10;

/// Battery sampling period.
const BATTERY_POLL_MS: u32 = 10_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    for line in banner(env!("CARGO_PKG_VERSION")) {
        info!("{}", line);
    }

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without PWM there is no flower.  The watchdog resets us.
        log::error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let mut watchdog = Watchdog::new(watchdog::DEFAULT_TIMEOUT_MS);

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = nvs
        .as_ref()
        .map_or_else(DeviceConfig::default, NvsAdapter::load_or_default);
    let mut applied = config.personification;

    // ── 4. Construct adapters ─────────────────────────────────
    let mac = device_id::read_mac();
    let serial = device_id::serial_number(&mac);
    info!("Device serial: {} (name: '{}')", serial, config.name);

    let petals = PetalsDriver::new(LedcChannel::servo(), applied.max_open_level);
    let led = RgbLed::new(
        LedcChannel::led(hw_init::LEDC_CH_LED_R),
        LedcChannel::led(hw_init::LEDC_CH_LED_G),
        LedcChannel::led(hw_init::LEDC_CH_LED_B),
        applied.color_brightness,
    );
    let mut flower = FlowerAdapter::new(petals, led);
    let mut radio = BleAdapter::new(config.name.clone(), serial.as_str());
    let mut rng = HwRandom::new();
    let mut log_sink = LogEventSink::new();
    let time = Esp32TimeAdapter::new();

    let mut touch = TouchClassifier::new(applied.touch_threshold);
    let mut battery = BatteryMonitor::new();
    let mut last_battery_poll: Option<u32> = None;

    // ── 5. Construct app service ──────────────────────────────
    let mut service = FlowerService::new(config);
    service.start(&mut log_sink);

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = time.now_ms();

        // Producers: touch leaf and battery.
        if let Some(gesture) = touch.sample(now_ms, TouchClassifier::read_pad()) {
            push_event(Event::Gesture(gesture));
        }
        if last_battery_poll.is_none_or(|t| now_ms.wrapping_sub(t) >= BATTERY_POLL_MS) {
            last_battery_poll = Some(now_ms);
            if let Some(status) = battery.poll() {
                push_event(Event::BatteryChanged(status));
            }
        }

        // Consumer: the one place domain state changes.
        let was_connected = service.remote().is_connected();
        service.drain(&EVENTS, &mut flower, &mut radio, &mut rng, &mut log_sink);

        // Personification written by a peer reaches the drivers here.
        let wanted = service.config().personification;
        if wanted != applied {
            apply_personification(&wanted, &mut touch, &mut flower);
            applied = wanted;
        }

        flower.tick(now_ms);
        // Servo only draws current while the flower is moving.
        hw_init::gpio_write(pins::SERVO_POWER_GPIO, flower.petals_moving());

        if let Some(nvs) = nvs.as_ref() {
            // A finished remote session flushes its edits straight away.
            if was_connected && !service.remote().is_connected() {
                service.force_save_if_dirty(nvs, &mut log_sink);
            }
            service.auto_save_if_needed(nvs, now_ms, &mut log_sink);
        }

        watchdog.feed();
        std::thread::sleep(std::time::Duration::from_millis(LOOP_PERIOD_MS));
    }
}

fn apply_personification<P, R, G, B>(
    p: &Personification,
    touch: &mut TouchClassifier,
    flower: &mut FlowerAdapter<P, R, G, B>,
) where
    P: embedded_hal::pwm::SetDutyCycle,
    R: embedded_hal::pwm::SetDutyCycle,
    G: embedded_hal::pwm::SetDutyCycle,
    B: embedded_hal::pwm::SetDutyCycle,
{
    info!(
        "Personification: touch={} speed={} max_open={} brightness={}",
        p.touch_threshold, p.speed, p.max_open_level, p.color_brightness
    );
    touch.set_threshold(p.touch_threshold);
    flower.apply_personification(p.color_brightness, p.max_open_level);
}
