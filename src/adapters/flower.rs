//! Flower actuator adapter.
//!
//! Implements [`FlowerPort`] on top of the petal servo and the RGB LED.
//! Every port call only records the requested motion; [`FlowerAdapter::tick`]
//! advances colour fades, petal travel and the rainbow sweep from the main
//! loop and pushes the interpolated values to the drivers.
//!
//! ```text
//!  set_color / set_petals_open_level ──▶ Fade / Travel ──tick(now)──▶ RgbLed / PetalsDriver
//! ```

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ColorMode, FlowerPort};
use crate::color::{BLACK, Rgb};
use crate::drivers::led::RgbLed;
use crate::drivers::petals::PetalsDriver;

/// One full trip around the hue wheel.
pub const RAINBOW_PERIOD_MS: u32 = 12_000;

#[derive(Debug, Clone, Copy)]
struct ColorFade {
    from: Rgb,
    to: Rgb,
    start_ms: u32,
    duration_ms: u32,
}

impl ColorFade {
    /// Colour at `now` and whether the fade has finished.
    fn at(&self, now_ms: u32) -> (Rgb, bool) {
        let elapsed = now_ms.wrapping_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            return (self.to, true);
        }
        let t = (u64::from(elapsed) * 1000 / u64::from(self.duration_ms)) as u16;
        (self.from.lerp(self.to, t), false)
    }
}

#[derive(Debug, Clone, Copy)]
struct PetalTravel {
    from: u8,
    to: u8,
    start_ms: u32,
    duration_ms: u32,
}

impl PetalTravel {
    fn at(&self, now_ms: u32) -> (u8, bool) {
        let elapsed = now_ms.wrapping_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            return (self.to, true);
        }
        let from = i32::from(self.from);
        let to = i32::from(self.to);
        let level = from + (to - from) * elapsed as i32 / self.duration_ms as i32;
        (level as u8, false)
    }
}

#[derive(Debug, Clone, Copy)]
enum Light {
    Steady,
    Fading(ColorFade),
    Rainbow { start_ms: u32 },
}

pub struct FlowerAdapter<P, R, G, B> {
    petals: PetalsDriver<P>,
    led: RgbLed<R, G, B>,
    now_ms: u32,
    light: Light,
    /// Colour the light settles on once the current fade ends.
    target_color: Rgb,
    /// Colour last pushed to the LED.
    rendered: Rgb,
    travel: Option<PetalTravel>,
    target_level: u8,
}

impl<P, R, G, B> FlowerAdapter<P, R, G, B>
where
    P: SetDutyCycle,
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    /// Wrap the drivers.  The flower starts dark with its petals closed.
    pub fn new(petals: PetalsDriver<P>, led: RgbLed<R, G, B>) -> Self {
        let mut flower = Self {
            petals,
            led,
            now_ms: 0,
            light: Light::Steady,
            target_color: BLACK,
            rendered: BLACK,
            travel: None,
            target_level: 0,
        };
        flower.render_color(BLACK);
        flower.render_level(0);
        flower
    }

    /// Advance every running motion to `now_ms` and drive the hardware.
    pub fn tick(&mut self, now_ms: u32) {
        self.now_ms = now_ms;

        match self.light {
            Light::Steady => {}
            Light::Fading(fade) => {
                let (color, done) = fade.at(now_ms);
                self.render_color(color);
                if done {
                    self.light = Light::Steady;
                }
            }
            Light::Rainbow { start_ms } => {
                self.render_color(rainbow_color(start_ms, now_ms));
            }
        }

        if let Some(travel) = self.travel {
            let (level, done) = travel.at(now_ms);
            self.render_level(level);
            if done {
                self.travel = None;
            }
        }
    }

    /// Re-apply brightness and petal travel limits after a
    /// personification change.  The current colour is re-rendered.
    pub fn apply_personification(&mut self, color_brightness: u8, max_open_level: u8) {
        self.led.set_brightness(color_brightness);
        self.petals.set_max_open_level(max_open_level);
        let color = self.rendered;
        self.render_color(color);
        let level = self.petals.level();
        self.render_level(level);
    }

    pub fn rendered_color(&self) -> Rgb {
        self.rendered
    }

    pub fn rendered_level(&self) -> u8 {
        self.petals.level()
    }

    pub fn petals_moving(&self) -> bool {
        self.travel.is_some()
    }

    fn render_color(&mut self, color: Rgb) {
        if let Err(channel) = self.led.show(color) {
            warn!("FlowerAdapter: LED {:?} channel write failed", channel);
        }
        self.rendered = color;
    }

    fn render_level(&mut self, level: u8) {
        if self.petals.set_level(level).is_err() {
            warn!("FlowerAdapter: servo write failed at {}%", level);
        }
    }
}

impl<P, R, G, B> FlowerPort for FlowerAdapter<P, R, G, B>
where
    P: SetDutyCycle,
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_color(&mut self, color: Rgb, mode: ColorMode, duration_ms: u32) {
        let now_ms = self.now_ms;
        match mode {
            ColorMode::Immediate => {
                self.light = Light::Steady;
                self.target_color = color;
                self.render_color(color);
            }
            ColorMode::Transition => {
                self.light = if duration_ms == 0 {
                    self.render_color(color);
                    Light::Steady
                } else {
                    Light::Fading(ColorFade {
                        from: self.rendered,
                        to: color,
                        start_ms: now_ms,
                        duration_ms,
                    })
                };
                self.target_color = color;
            }
            ColorMode::Flash => {
                // Back to whatever the light was heading for.
                let back = self.color();
                self.target_color = back;
                self.render_color(color);
                self.light = if duration_ms == 0 {
                    self.render_color(back);
                    Light::Steady
                } else {
                    Light::Fading(ColorFade {
                        from: color,
                        to: back,
                        start_ms: now_ms,
                        duration_ms,
                    })
                };
            }
        }
    }

    fn set_petals_open_level(&mut self, percent: u8, duration_ms: u32) {
        let percent = percent.min(100);
        self.target_level = percent;
        if duration_ms == 0 {
            self.travel = None;
            self.render_level(percent);
        } else {
            self.travel = Some(PetalTravel {
                from: self.petals.level(),
                to: percent,
                start_ms: self.now_ms,
                duration_ms,
            });
        }
    }

    fn start_rainbow(&mut self) {
        self.light = Light::Rainbow {
            start_ms: self.now_ms,
        };
    }

    fn stop_rainbow_retain_color(&mut self) {
        if self.is_rainbow() {
            self.light = Light::Steady;
            self.target_color = self.rendered;
        }
    }

    fn is_idle(&self) -> bool {
        !matches!(self.light, Light::Fading(_)) && self.travel.is_none()
    }

    fn is_lit(&self) -> bool {
        self.is_rainbow() || !self.target_color.is_black()
    }

    fn is_rainbow(&self) -> bool {
        matches!(self.light, Light::Rainbow { .. })
    }

    fn petals_open_level(&self) -> u8 {
        self.target_level
    }

    fn color(&self) -> Rgb {
        if self.is_rainbow() {
            self.rendered
        } else {
            self.target_color
        }
    }
}

fn rainbow_color(start_ms: u32, now_ms: u32) -> Rgb {
    let phase = now_ms.wrapping_sub(start_ms) % RAINBOW_PERIOD_MS;
    Rgb::from_hue((phase * 360 / RAINBOW_PERIOD_MS) as u16)
}
