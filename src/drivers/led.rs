//! RGB blossom light on three PWM channels.

use embedded_hal::pwm::SetDutyCycle;

use crate::color::Rgb;

pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    /// Percent (1–100).
    brightness: u8,
    shown: Rgb,
}

/// PWM failure on one of the colour channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedChannel {
    Red,
    Green,
    Blue,
}

impl<R, G, B> RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(red: R, green: G, blue: B, brightness: u8) -> Self {
        Self {
            red,
            green,
            blue,
            brightness: brightness.clamp(1, 100),
            shown: Rgb::default(),
        }
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness.clamp(1, 100);
    }

    /// Colour last written (before brightness scaling).
    pub fn shown(&self) -> Rgb {
        self.shown
    }

    pub fn show(&mut self, color: Rgb) -> Result<(), LedChannel> {
        let scale = |v: u8, max: u16| -> u16 {
            (u32::from(v) * u32::from(self.brightness) * u32::from(max) / (255 * 100)) as u16
        };
        let r = scale(color.r, self.red.max_duty_cycle());
        let g = scale(color.g, self.green.max_duty_cycle());
        let b = scale(color.b, self.blue.max_duty_cycle());
        self.red.set_duty_cycle(r).map_err(|_| LedChannel::Red)?;
        self.green.set_duty_cycle(g).map_err(|_| LedChannel::Green)?;
        self.blue.set_duty_cycle(b).map_err(|_| LedChannel::Blue)?;
        self.shown = color;
        Ok(())
    }
}
