// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Background monitor loop.
//!
//! Runs cooperatively in the main loop, below both timer interrupts. It owns the command
//! transport parser, the battery threshold latch and the gas-sensor measurement state. It never
//! touches servo ramp state; locomotion state is read through a [`LocomotionSnapshot`] that may
//! be one tick old.

use crate::control::battery::{BatteryEvent, BatteryGuard, BatteryLevel};
use crate::control::locomotion::{LocomotionSnapshot, WalkMode};
use crate::drivers::{Alarm, AlertPattern};
use crate::error::DriverError;
use crate::protocol::messages::{CMD_MEASURE_START, CMD_MEASURE_STOP, CMD_STAND, CMD_WHEEL_STOP};
use crate::protocol::{CommandMailbox, Parser};

/// Gas sensor collaborator (ZMOD4410 on the robot).
pub trait GasSensor {
    fn start_measurement(&mut self);
    fn stop_measurement(&mut self);

    /// True if the sensor status changed since the previous call.
    fn status_changed(&mut self) -> bool;
}

/// Build without a gas sensor fitted. Measurement commands are accepted and never alert.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoGasSensor;

impl GasSensor for NoGasSensor {
    fn start_measurement(&mut self) {
        log::warn!("no gas sensor fitted");
    }

    fn stop_measurement(&mut self) {}

    fn status_changed(&mut self) -> bool {
        false
    }
}

/// State of the background loop between passes.
pub struct BackgroundMonitor<G, A> {
    parser: Parser,
    battery: BatteryGuard,
    gas: G,
    alarm: A,
    measuring: bool,
    frames: u32,
}

impl<G: GasSensor, A: Alarm> BackgroundMonitor<G, A> {
    pub fn new(gas: G, alarm: A) -> Self {
        Self {
            parser: Parser::new(),
            battery: BatteryGuard::new(),
            gas,
            alarm,
            measuring: false,
            frames: 0,
        }
    }

    /// Frames accepted from the transport since boot.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    #[inline]
    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    #[inline]
    pub fn battery_low(&self) -> bool {
        self.battery.is_low()
    }

    #[inline]
    pub fn alarm(&self) -> &A {
        &self.alarm
    }

    #[inline]
    pub fn gas(&self) -> &G {
        &self.gas
    }

    /// Sound the alert pattern from outside the loop (stop path).
    pub fn raise_alert(&mut self) {
        self.alarm.sound(AlertPattern::ALERT);
    }

    /// One pass of the background loop.
    pub fn poll<I>(
        &mut self,
        rx: I,
        mailbox: &CommandMailbox,
        battery: &BatteryLevel,
        locomotion: &LocomotionSnapshot,
        now_ms: u32,
    ) -> Result<(), DriverError>
    where
        I: IntoIterator<Item = u8>,
    {
        self.drain(rx, mailbox);
        self.check_battery(battery, mailbox, locomotion);
        self.poll_gas(mailbox);
        self.alarm.service(now_ms)
    }

    fn drain<I: IntoIterator<Item = u8>>(&mut self, rx: I, mailbox: &CommandMailbox) {
        for byte in rx {
            if let Some(code) = self.parser.push(byte) {
                log::debug!("received command {:#04x}", code);
                mailbox.post(code);
                self.frames = self.frames.wrapping_add(1);
            }
        }
    }

    fn check_battery(
        &mut self,
        battery: &BatteryLevel,
        mailbox: &CommandMailbox,
        locomotion: &LocomotionSnapshot,
    ) {
        let mv = battery.millivolts();
        match self.battery.check(mv) {
            Some(BatteryEvent::WentLow) => {
                let stop = match locomotion.load().mode {
                    WalkMode::Legged => CMD_STAND,
                    WalkMode::Wheeled => CMD_WHEEL_STOP,
                };
                log::error!("battery low ({} mV), posting stop {:#04x}", mv, stop);
                mailbox.post(stop);
                self.alarm.sound(AlertPattern::ALERT);
            }
            Some(BatteryEvent::Recovered) => {
                log::info!("battery recovered ({} mV)", mv);
            }
            None => {}
        }
    }

    fn poll_gas(&mut self, mailbox: &CommandMailbox) {
        match mailbox.latest() {
            CMD_MEASURE_START => {
                if !self.measuring {
                    log::info!("gas measurement started");
                    self.gas.start_measurement();
                    self.measuring = true;
                }
                if self.gas.status_changed() {
                    log::warn!("gas sensor status changed");
                    self.alarm.sound(AlertPattern::ALERT);
                }
            }
            CMD_MEASURE_STOP => {
                if self.measuring {
                    log::info!("gas measurement stopped");
                    self.gas.stop_measurement();
                    self.measuring = false;
                }
            }
            _ => {}
        }
    }
}
