// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LEDs. The green LED doubles as the motion tick heartbeat.

use embedded_hal::digital::v2::OutputPin;

use crate::control::Heartbeat;

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

pub struct StatusLed<PIN> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> StatusLed<PIN> {
    /// Wrap `pin` and switch the LED off.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: true,
        };
        led.set(false);
        led
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn set(&mut self, on: bool) {
        let high = match self.active {
            ActiveLevel::High => on,
            ActiveLevel::Low => !on,
        };
        // GPIO writes on this part are infallible.
        let _ = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        self.is_on = on;
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }
}

impl<PIN: OutputPin> Heartbeat for StatusLed<PIN> {
    #[inline]
    fn toggle(&mut self) {
        self.set(!self.is_on);
    }
}
