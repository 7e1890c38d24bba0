// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Hardware Layer
//!
//! STM32F777 wrappers used by the firmware binary. Everything here is compiled only for the MCU
//! target; the rest of the crate reaches hardware through traits.

pub mod adc;
pub mod i2c;
pub mod led;
pub mod pins;
pub mod pwm;
pub mod timer;
pub mod usart;

pub use adc::BatterySense;
pub use i2c::SharedI2c;
pub use led::StatusLed;
pub use pins::BoardPins;
pub use pwm::SteeringPwm;
pub use timer::TickTimer;
pub use usart::{CommandPort, Usart, UsartLogger};
