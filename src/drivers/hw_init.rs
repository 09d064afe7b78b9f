//! One-shot hardware peripheral initialization.
//!
//! Configures the battery ADC channel, GPIO directions, the touch pad and
//! the LEDC timers/channels using raw ESP-IDF sys calls.  Called once from
//! `main()` before the event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    TouchInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::TouchInitFailed(rc)  => write!(f, "touch pad init failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio()?;
        init_touch()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(err(ret)) }
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    check(unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) }, HwInitError::AdcInitFailed)?;

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    check(
        unsafe { adc_oneshot_config_channel(adc1_handle(), pins::BATTERY_ADC_CHANNEL, &chan_cfg) },
        HwInitError::AdcInitFailed,
    )?;

    info!("hw_init: ADC1 configured (CH{}=battery)", pins::BATTERY_ADC_CHANNEL);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    let charge_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::CHARGE_STATE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&charge_cfg) }, HwInitError::GpioConfigFailed)?;

    let power_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::SERVO_POWER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&power_cfg) }, HwInitError::GpioConfigFailed)?;
    unsafe { gpio_set_level(pins::SERVO_POWER_GPIO, 0) };

    info!("hw_init: GPIO configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output in init_gpio(). Main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Touch pad ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_touch() -> Result<(), HwInitError> {
    check(unsafe { touch_pad_init() }, HwInitError::TouchInitFailed)?;
    check(
        unsafe { touch_pad_config(pins::TOUCH_PAD as touch_pad_t, 0) },
        HwInitError::TouchInitFailed,
    )?;
    check(unsafe { touch_pad_filter_start(10) }, HwInitError::TouchInitFailed)?;
    info!("hw_init: touch pad T{} configured", pins::TOUCH_PAD);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn touch_read(pad: u32) -> u16 {
    let mut value: u16 = u16::MAX;
    // SAFETY: touch driver initialised in init_touch(); main-loop only.
    let ret = unsafe { touch_pad_read_filtered(pad as touch_pad_t, &mut value) };
    if ret != ESP_OK as i32 {
        return u16::MAX;
    }
    value
}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_SERVO: u32 = 0;
pub const LEDC_CH_LED_R: u32 = 1;
pub const LEDC_CH_LED_G: u32 = 2;
pub const LEDC_CH_LED_B: u32 = 3;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: servo (50 Hz, 14-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer0) }, HwInitError::LedcInitFailed)?;

    // Timer 1: RGB light (5 kHz, 8-bit)
    let timer1 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_1,
        duty_resolution: pins::LED_PWM_RESOLUTION_BITS,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer1) }, HwInitError::LedcInitFailed)?;

    check(
        unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: LEDC_CH_SERVO,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::SERVO_PWM_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) },
        HwInitError::LedcInitFailed,
    )?;

    let led_gpios = [
        (LEDC_CH_LED_R, pins::LED_R_GPIO),
        (LEDC_CH_LED_G, pins::LED_G_GPIO),
        (LEDC_CH_LED_B, pins::LED_B_GPIO),
    ];
    for (channel, gpio) in led_gpios {
        check(
            unsafe { ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel,
                timer_sel: ledc_timer_t_LEDC_TIMER_1,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            }) },
            HwInitError::LedcInitFailed,
        )?;
    }

    info!("hw_init: LEDC configured (servo=CH0, led=CH1-3)");
    Ok(())
}

/// One LEDC output channel, exposed through the `embedded-hal` PWM trait
/// so the petal and light drivers stay hardware-agnostic.
pub struct LedcChannel {
    channel: u32,
    max_duty: u16,
    #[cfg(not(target_os = "espidf"))]
    duty: u16,
}

impl LedcChannel {
    pub fn new(channel: u32, resolution_bits: u32) -> Self {
        Self {
            channel,
            max_duty: ((1u32 << resolution_bits) - 1) as u16,
            #[cfg(not(target_os = "espidf"))]
            duty: 0,
        }
    }

    pub fn servo() -> Self {
        Self::new(LEDC_CH_SERVO, crate::pins::SERVO_PWM_RESOLUTION_BITS)
    }

    pub fn led(channel: u32) -> Self {
        Self::new(channel, crate::pins::LED_PWM_RESOLUTION_BITS)
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Simulation: last duty written.
    #[cfg(not(target_os = "espidf"))]
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

/// LEDC duty register write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub i32);

impl embedded_hal::pwm::Error for LedcError {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

impl ErrorType for LedcChannel {
    type Error = LedcError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    #[cfg(target_os = "espidf")]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        // SAFETY: LEDC channels were configured in init_ledc(); duty register
        // writes are race-free since only the main loop drives them.
        unsafe {
            let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel, u32::from(duty));
            if ret != ESP_OK as i32 {
                return Err(LedcError(ret));
            }
            let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.channel);
            if ret != ESP_OK as i32 {
                return Err(LedcError(ret));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        self.duty = duty.min(self.max_duty);
        Ok(())
    }
}
