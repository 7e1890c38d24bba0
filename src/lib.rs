// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # RocBot Firmware
//!
//! Motion core for the RocBot hexapod, written in Rust, targeting an STM32F777 MCU. The robot
//! walks on six three-joint legs driven through two chained PCA9685 PWM controllers and can
//! switch to a steered wheel for flat ground.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | MCU-level wrappers around USART, I2C, ADC, timers, etc. (target only) |
//! | [`drivers`] | Device-level drivers (PCA9685 pair, wheel H-bridge, beeper) |
//! | [`control`] | Servo ramp engine, motion scheduler, gait, battery monitoring |
//! | [`protocol`] | Command codes, framed parser, mailbox and dispatcher |
//! | [`monitor`] | Background loop: transport, battery safety, gas sensor |
//! | [`config`] | Compile-time tuning constants |
//! | [`error`] | Error types shared across the crate |
//!
//! Everything outside [`hw`] is hardware-agnostic and runs in host tests.
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Run the host simulation:
//!
//! ```bash
//! cargo run -- --commands 0x02,0x04 --cycles 6
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
#[cfg(target_os = "none")]
pub mod hw;
pub mod monitor;
pub mod protocol;
