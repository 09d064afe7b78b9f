//! GPIO / peripheral pin assignments for the Floower main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Petal servo
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the petal servo.
pub const SERVO_PWM_GPIO: i32 = 26;
/// Digital output: powers the servo rail (active HIGH).
pub const SERVO_POWER_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Blossom light (discrete RGB behind a diffuser)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 27;
pub const LED_G_GPIO: i32 = 14;
pub const LED_B_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Touch leaf (capacitive)
// ---------------------------------------------------------------------------

/// Touch pad T4 (GPIO 13 on ESP32).
pub const TOUCH_PAD: u32 = 4;

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Battery voltage through a 1:2 divider.  ADC1 channel 0 (GPIO 36).
pub const BATTERY_ADC_GPIO: i32 = 36;
pub const BATTERY_ADC_CHANNEL: u32 = 0;
/// Digital input: LOW while the USB charger is active.
pub const CHARGE_STATE_GPIO: i32 = 39;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Servo frame rate (50 Hz, 20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// Servo timer resolution; 14 bits gives ~1.2 µs steps.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// LEDC frequency for the RGB light (5 kHz, flicker-free on camera).
pub const LED_PWM_FREQ_HZ: u32 = 5_000;
/// LED timer resolution.  8-bit gives 0 – 255 duty levels.
pub const LED_PWM_RESOLUTION_BITS: u32 = 8;
