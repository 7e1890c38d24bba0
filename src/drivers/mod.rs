// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-level drivers and the collaborator contracts the control core
//! talks to. Everything here is generic over embedded-hal 0.2 traits so it runs on the board and
//! under host tests alike.
//!
//! ## Existing drivers
//!
//! - [`pwm_sink`] – 32-channel PWM sink contract
//! - [`pca9685`] – two chained NXP PCA9685 16-channel PWM expanders
//! - [`wheel`] – H-bridge wheel motor and steering servo
//! - [`beeper`] – GPIO piezo beeper with non-blocking alert patterns

pub mod beeper;
pub mod pca9685;
pub mod pwm_sink;
pub mod wheel;

pub use beeper::{Alarm, AlertPattern, GpioBeeper};
pub use pca9685::DualPca9685;
pub use pwm_sink::{off_time, Chip, PwmSink};
pub use wheel::{HBridgeWheel, WheelDirection, WheelDriver};
