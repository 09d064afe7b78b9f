//! Petal servo driver.
//!
//! The petals hang on a hobby servo fed a 50 Hz frame.  Openness in
//! percent maps linearly onto the pulse width between the closed and
//! fully-open stops, scaled by the personification's maximum travel.

use embedded_hal::pwm::SetDutyCycle;

/// Pulse width with the petals fully closed.
pub const CLOSED_PULSE_US: u32 = 1_000;
/// Pulse width with the petals fully open.
pub const OPEN_PULSE_US: u32 = 2_000;
/// Servo frame period at 50 Hz.
const FRAME_US: u32 = 20_000;

pub struct PetalsDriver<P> {
    pwm: P,
    max_open_level: u8,
    level: u8,
}

impl<P: SetDutyCycle> PetalsDriver<P> {
    pub fn new(pwm: P, max_open_level: u8) -> Self {
        Self {
            pwm,
            max_open_level: max_open_level.min(100),
            level: 0,
        }
    }

    /// Upper bound of travel in percent of the mechanical range.
    pub fn set_max_open_level(&mut self, max_open_level: u8) {
        self.max_open_level = max_open_level.min(100);
    }

    /// Last commanded level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Drive the servo to `percent` (0–100) of the allowed travel.
    pub fn set_level(&mut self, percent: u8) -> Result<(), P::Error> {
        let percent = percent.min(100);
        let duty = self.duty_for(percent);
        self.pwm.set_duty_cycle(duty)?;
        self.level = percent;
        Ok(())
    }

    fn duty_for(&self, percent: u8) -> u16 {
        let travel = u32::from(percent) * u32::from(self.max_open_level) / 100;
        let pulse_us = CLOSED_PULSE_US + (OPEN_PULSE_US - CLOSED_PULSE_US) * travel / 100;
        (u32::from(self.pwm.max_duty_cycle()) * pulse_us / FRAME_US) as u16
    }
}
