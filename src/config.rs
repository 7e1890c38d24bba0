// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Compile-time limits for the motion core.
//!
//! Nothing here is reconfigurable at runtime except the nominal speed, which is bounded by
//! [`MIN_SPEED_MS`] and [`MAX_SPEED_MS`].

/// Logical servo channels across both PWM expanders.
pub const CHANNEL_COUNT: usize = 32;

/// Channels on a single PCA9685.
pub const CHIP_CHANNELS: usize = 16;

/// I2C address of the first expander (channels 0..16).
pub const CHIP_A_ADDRESS: u8 = 0x40;

/// I2C address of the second expander (channels 16..32).
pub const CHIP_B_ADDRESS: u8 = 0x41;

/// PCA9685 prescaler. 25 MHz / (4096 * (121 + 1)) ≈ 50 Hz servo frame.
pub const PCA9685_PRESCALE: u8 = 121;

// Servo ramp
pub const MIN_PWM: i16 = 1000;
pub const MAX_PWM: i16 = 4000;
pub const STEPS_PER_CYCLE: u8 = 10;

/// Largest value accepted by the 12-bit "off" edge register.
pub const PWM_OFF_MAX: u16 = 0x0FFF;

// Gait defaults
pub const DEFAULT_LEG_STEP: f32 = 40.0;
pub const DEFAULT_FEET_LIFT: f32 = 30.0;
pub const DEFAULT_TURN_ANGLE: f32 = 15.0;

// Steering servo (degrees)
pub const STEERING_CENTER_DEG: u8 = 90;
pub const STEERING_OFFSET_DEG: u8 = 30;
pub const STEERING_MAX_DEG: u8 = 180;

/// Steering pulse width range at 50 Hz, in microseconds.
pub const STEERING_MIN_PULSE_US: u32 = 500;
pub const STEERING_MAX_PULSE_US: u32 = 2500;
pub const STEERING_FRAME_US: u32 = 20_000;

// Speed control: duration of one full ramp cycle.
pub const DEFAULT_SPEED_MS: u16 = 400;
pub const MIN_SPEED_MS: u16 = 100;
pub const MAX_SPEED_MS: u16 = 2000;

/// Motion timer counter clock. One count = 100 us.
pub const MOTION_TIMER_BASE_HZ: u32 = 10_000;

/// Battery sampling period.
pub const BATTERY_TICK_MS: u16 = 10;

// Battery (millivolts at the pack, after the divider is undone)
pub const BATTERY_LOW_MV: u16 = 6800;
pub const BATTERY_HYSTERESIS_MV: u16 = 200;
pub const ADC_REFERENCE_MV: u32 = 3300;
pub const ADC_FULL_SCALE: u32 = 4095;
/// Resistor divider ratio, numerator over [`BATTERY_DIVIDER_DEN`].
pub const BATTERY_DIVIDER_NUM: u32 = 11;
pub const BATTERY_DIVIDER_DEN: u32 = 3;

// Alert pattern used by the stop path and the gas sensor.
pub const ALERT_BEEPS: u8 = 4;
pub const ALERT_PERIOD_MS: u16 = 800;

/// Servo ramp limits handed to [`ServoEngine`](crate::control::ServoEngine).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RampConfig {
    pub min_pwm: i16,
    pub max_pwm: i16,
    /// Ticks per ramp cycle. Must be at least 2 for the look-ahead flag to fire.
    pub steps_per_cycle: u8,
}

impl RampConfig {
    pub const DEFAULT: RampConfig = RampConfig {
        min_pwm: MIN_PWM,
        max_pwm: MAX_PWM,
        steps_per_cycle: STEPS_PER_CYCLE,
    };
}

impl Default for RampConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
