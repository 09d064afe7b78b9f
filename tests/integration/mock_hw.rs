//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real PWM or radio hardware.

use std::cell::{Cell, RefCell};

use floower::app::events::AppEvent;
use floower::app::ports::{ColorMode, ConfigError, ConfigPort, EventSink, FlowerPort, RadioPort, RandomSource};
use floower::color::{BLACK, Rgb};
use floower::config::DeviceConfig;
use floower::remote::protocol::CharacteristicId;

// ── Flower call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum FlowerCall {
    SetColor { color: Rgb, mode: ColorMode, duration_ms: u32 },
    SetPetals { percent: u8, duration_ms: u32 },
    StartRainbow,
    StopRainbow,
}

// ── MockFlower ────────────────────────────────────────────────

/// Flower that completes nothing on its own: `idle` is whatever the test
/// says it is.
pub struct MockFlower {
    pub calls: Vec<FlowerCall>,
    pub idle: bool,
    pub color: Rgb,
    pub level: u8,
    pub rainbow: bool,
    /// Colour the rainbow is showing at the moment it is stopped.
    pub rainbow_color: Rgb,
}

#[allow(dead_code)]
impl MockFlower {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            idle: true,
            color: BLACK,
            level: 0,
            rainbow: false,
            rainbow_color: Rgb::new(10, 200, 30),
        }
    }

    pub fn take_calls(&mut self) -> Vec<FlowerCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_color(&self) -> Option<Rgb> {
        self.calls.iter().rev().find_map(|c| match c {
            FlowerCall::SetColor { color, .. } => Some(*color),
            _ => None,
        })
    }
}

impl Default for MockFlower {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowerPort for MockFlower {
    fn set_color(&mut self, color: Rgb, mode: ColorMode, duration_ms: u32) {
        self.calls.push(FlowerCall::SetColor {
            color,
            mode,
            duration_ms,
        });
        self.rainbow = false;
        if mode != ColorMode::Flash {
            self.color = color;
        }
    }

    fn set_petals_open_level(&mut self, percent: u8, duration_ms: u32) {
        self.calls.push(FlowerCall::SetPetals {
            percent,
            duration_ms,
        });
        self.level = percent;
    }

    fn start_rainbow(&mut self) {
        self.calls.push(FlowerCall::StartRainbow);
        self.rainbow = true;
    }

    fn stop_rainbow_retain_color(&mut self) {
        self.calls.push(FlowerCall::StopRainbow);
        if self.rainbow {
            self.rainbow = false;
            self.color = self.rainbow_color;
        }
    }

    fn is_idle(&self) -> bool {
        self.idle
    }

    fn is_lit(&self) -> bool {
        self.rainbow || !self.color.is_black()
    }

    fn is_rainbow(&self) -> bool {
        self.rainbow
    }

    fn petals_open_level(&self) -> u8 {
        self.level
    }

    fn color(&self) -> Rgb {
        if self.rainbow { self.rainbow_color } else { self.color }
    }
}

// ── MockRadio ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    StartAdvertising,
    StopAdvertising,
    Notify(CharacteristicId, Vec<u8>),
}

pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    pub advertising: bool,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            advertising: false,
        }
    }

    pub fn take_calls(&mut self) -> Vec<RadioCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn notifications(&self, id: CharacteristicId) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Notify(cid, v) if *cid == id => Some(v.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioPort for MockRadio {
    fn start_advertising(&mut self) {
        self.calls.push(RadioCall::StartAdvertising);
        self.advertising = true;
    }

    fn stop_advertising(&mut self) {
        self.calls.push(RadioCall::StopAdvertising);
        self.advertising = false;
    }

    fn notify(&mut self, characteristic: CharacteristicId, value: &[u8]) {
        self.calls.push(RadioCall::Notify(characteristic, value.to_vec()));
    }
}

// ── ScriptedRandom ────────────────────────────────────────────

/// Replays a fixed list of draws, cycling when exhausted.
pub struct ScriptedRandom {
    draws: Vec<usize>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(draws: &[usize]) -> Self {
        Self {
            draws: draws.to_vec(),
            pos: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&mut self, bound: usize) -> usize {
        let v = self.draws[self.pos % self.draws.len()];
        self.pos += 1;
        v % bound
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    pub saved: RefCell<Option<DeviceConfig>>,
    pub saves: Cell<u32>,
    pub fail: Cell<bool>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            saved: RefCell::new(None),
            saves: Cell::new(0),
            fail: Cell::new(false),
        }
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        self.saved.borrow().clone().ok_or(ConfigError::NotFound)
    }

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError> {
        if self.fail.get() {
            return Err(ConfigError::IoError);
        }
        floower::config::validate(config)?;
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
