// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Piezo beeper on a GPIO pin, driven without blocking.
//!
//! [`Alarm::sound`] arms a pattern; the background loop calls [`Alarm::service`] with a
//! millisecond timestamp and the beeper toggles itself until the pattern is exhausted.

use embedded_hal::digital::v2::OutputPin;

use crate::config::{ALERT_BEEPS, ALERT_PERIOD_MS};
use crate::error::DriverError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlertPattern {
    pub beeps: u8,
    /// Full on + off period of one beep.
    pub period_ms: u16,
}

impl AlertPattern {
    /// Pattern used by the stop path, low battery and gas-sensor changes.
    pub const ALERT: AlertPattern = AlertPattern {
        beeps: ALERT_BEEPS,
        period_ms: ALERT_PERIOD_MS,
    };
}

pub trait Alarm {
    /// Start a pattern, replacing whatever is playing.
    fn sound(&mut self, pattern: AlertPattern);

    /// Advance the pattern. Call often; `now_ms` must be monotonic.
    fn service(&mut self, now_ms: u32) -> Result<(), DriverError>;

    fn is_sounding(&self) -> bool;
}

/// Non-blocking [`Alarm`] on a push-pull GPIO.
pub struct GpioBeeper<P> {
    pin: P,
    /// Remaining on/off edges.
    edges_left: u16,
    half_period_ms: u16,
    next_edge_ms: Option<u32>,
    is_on: bool,
}

impl<P: OutputPin> GpioBeeper<P> {
    pub fn new(mut pin: P) -> Result<Self, DriverError> {
        pin.set_low().map_err(|_| DriverError::BeeperPin)?;
        Ok(Self {
            pin,
            edges_left: 0,
            half_period_ms: 0,
            next_edge_ms: None,
            is_on: false,
        })
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> P {
        self.pin
    }

    fn drive(&mut self, on: bool) -> Result<(), DriverError> {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| DriverError::BeeperPin)?;
        self.is_on = on;
        Ok(())
    }
}

impl<P: OutputPin> Alarm for GpioBeeper<P> {
    fn sound(&mut self, pattern: AlertPattern) {
        self.edges_left = pattern.beeps as u16 * 2;
        if self.is_on {
            // first edge turns the running beep off, then the pattern starts from silence
            self.edges_left += 1;
        }
        self.half_period_ms = pattern.period_ms / 2;
        self.next_edge_ms = None;
    }

    fn service(&mut self, now_ms: u32) -> Result<(), DriverError> {
        if self.edges_left == 0 {
            return Ok(());
        }

        let due = match self.next_edge_ms {
            None => true,
            Some(at) => now_ms.wrapping_sub(at) < u32::MAX / 2,
        };
        if !due {
            return Ok(());
        }

        let next = !self.is_on;
        self.drive(next)?;
        self.edges_left -= 1;
        self.next_edge_ms = Some(now_ms.wrapping_add(self.half_period_ms as u32));

        if self.edges_left == 0 && self.is_on {
            self.drive(false)?;
        }
        Ok(())
    }

    fn is_sounding(&self) -> bool {
        self.edges_left > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pin {
        high: bool,
        rises: u32,
    }

    impl OutputPin for Pin {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ()> {
            if !self.high {
                self.rises += 1;
            }
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn alert_pattern_beeps_four_times_then_goes_quiet() {
        let mut beeper = GpioBeeper::new(Pin::default()).unwrap();
        beeper.sound(AlertPattern::ALERT);
        assert!(beeper.is_sounding());

        let mut now = 0;
        while beeper.is_sounding() && now < 60_000 {
            beeper.service(now).unwrap();
            now += 100;
        }

        assert!(!beeper.is_sounding());
        assert!(!beeper.is_on());
        let pin = beeper.free();
        assert_eq!(pin.rises, 4);
        // 8 edges, 400 ms apart
        assert!(now >= 7 * 400);
    }

    #[test]
    fn edges_wait_for_half_period() {
        let mut beeper = GpioBeeper::new(Pin::default()).unwrap();
        beeper.sound(AlertPattern {
            beeps: 1,
            period_ms: 200,
        });

        beeper.service(1000).unwrap();
        assert!(beeper.is_on());
        beeper.service(1050).unwrap();
        assert!(beeper.is_on());
        beeper.service(1100).unwrap();
        assert!(!beeper.is_on());
        assert!(!beeper.is_sounding());
    }

    #[test]
    fn rearming_mid_beep_still_plays_every_beep_in_full() {
        let mut beeper = GpioBeeper::new(Pin::default()).unwrap();
        beeper.sound(AlertPattern::ALERT);
        beeper.service(0).unwrap();
        assert!(beeper.is_on());

        beeper.sound(AlertPattern::ALERT);

        let mut beeps = Vec::new();
        let mut went_on = None;
        let mut now = 100;
        while beeper.is_sounding() && now < 60_000 {
            let was_on = beeper.is_on();
            beeper.service(now).unwrap();
            match (was_on, beeper.is_on()) {
                (false, true) => went_on = Some(now),
                (true, false) => {
                    if let Some(at) = went_on.take() {
                        beeps.push(now - at);
                    }
                }
                _ => {}
            }
            now += 100;
        }

        assert!(!beeper.is_on());
        assert_eq!(beeps, [400, 400, 400, 400]);
        // one rise before the re-arm, four after
        assert_eq!(beeper.free().rises, 5);
    }
}
