// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! RocBot firmware entry point.
//!
//! On the MCU this is the firmware image. On a host it runs the motion core against simulated
//! hardware, see `rocbot --help`.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware;

#[cfg(not(target_os = "none"))]
mod sim;

#[cfg(not(target_os = "none"))]
fn main() {
    if let Err(e) = sim::run() {
        eprintln!("rocbot: {}", e);
        std::process::exit(1);
    }
}
