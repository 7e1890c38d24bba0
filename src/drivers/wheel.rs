// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wheeled-mode drive: one DC wheel motor behind an H-bridge plus a steering servo.
//!
//! Wiring:
//! - IN1 high, IN2 low: forward
//! - IN1 low, IN2 high: reverse
//! - both low: stopped (coast)
//! - steering servo on a 50 Hz hardware PWM channel

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::{
    STEERING_CENTER_DEG, STEERING_FRAME_US, STEERING_MAX_DEG, STEERING_MAX_PULSE_US,
    STEERING_MIN_PULSE_US,
};
use crate::error::DriverError;

/// Logical wheel motor direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WheelDirection {
    Forward,
    Reverse,
    Stopped,
}

/// Direct wheeled-mode actuator commands issued by the dispatcher.
pub trait WheelDriver {
    fn set_direction(&mut self, direction: WheelDirection) -> Result<(), DriverError>;

    /// Steering angle in degrees, `0..=180`, 90 is straight ahead.
    fn set_steering_angle(&mut self, degrees: u8) -> Result<(), DriverError>;

    #[inline]
    fn stop(&mut self) -> Result<(), DriverError> {
        self.set_direction(WheelDirection::Stopped)
    }
}

/// Wheel motor on a two-input H-bridge plus a PWM steering servo.
pub struct HBridgeWheel<In1, In2, Steer> {
    in1: In1,
    in2: In2,
    steer: Steer,
    direction: WheelDirection,
    steering_deg: u8,
}

impl<In1, In2, Steer> HBridgeWheel<In1, In2, Steer>
where
    In1: OutputPin,
    In2: OutputPin,
    Steer: PwmPin<Duty = u16>,
{
    /// Take the pins, stop the motor and centre the steering.
    pub fn new(in1: In1, in2: In2, mut steer: Steer) -> Result<Self, DriverError> {
        steer.enable();
        let mut wheel = Self {
            in1,
            in2,
            steer,
            direction: WheelDirection::Stopped,
            steering_deg: STEERING_CENTER_DEG,
        };
        wheel.set_direction(WheelDirection::Stopped)?;
        wheel.set_steering_angle(STEERING_CENTER_DEG)?;
        Ok(wheel)
    }

    #[inline]
    pub fn direction(&self) -> WheelDirection {
        self.direction
    }

    #[inline]
    pub fn steering_deg(&self) -> u8 {
        self.steering_deg
    }

    pub fn free(self) -> (In1, In2, Steer) {
        (self.in1, self.in2, self.steer)
    }

    /// Duty value for a steering angle given the PWM channel resolution.
    pub fn steering_duty(degrees: u8, max_duty: u16) -> u16 {
        let span = STEERING_MAX_PULSE_US - STEERING_MIN_PULSE_US;
        let pulse_us = STEERING_MIN_PULSE_US + span * degrees as u32 / STEERING_MAX_DEG as u32;
        (max_duty as u32 * pulse_us / STEERING_FRAME_US) as u16
    }
}

impl<In1, In2, Steer> WheelDriver for HBridgeWheel<In1, In2, Steer>
where
    In1: OutputPin,
    In2: OutputPin,
    Steer: PwmPin<Duty = u16>,
{
    fn set_direction(&mut self, direction: WheelDirection) -> Result<(), DriverError> {
        let (a, b) = match direction {
            WheelDirection::Forward => (true, false),
            WheelDirection::Reverse => (false, true),
            WheelDirection::Stopped => (false, false),
        };

        // Drop both legs first so the bridge never shoots through while switching.
        self.in1.set_low().map_err(|_| DriverError::WheelPin)?;
        self.in2.set_low().map_err(|_| DriverError::WheelPin)?;
        if a {
            self.in1.set_high().map_err(|_| DriverError::WheelPin)?;
        }
        if b {
            self.in2.set_high().map_err(|_| DriverError::WheelPin)?;
        }

        if direction != self.direction {
            log::debug!("wheel {:?} -> {:?}", self.direction, direction);
        }
        self.direction = direction;
        Ok(())
    }

    fn set_steering_angle(&mut self, degrees: u8) -> Result<(), DriverError> {
        if degrees > STEERING_MAX_DEG {
            return Err(DriverError::SteeringAngle(degrees));
        }
        let duty = Self::steering_duty(degrees, self.steer.get_max_duty());
        self.steer.set_duty(duty);
        self.steering_deg = degrees;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct Pin {
        high: bool,
        fail: bool,
    }

    impl OutputPin for Pin {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.high = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Servo {
        duty: u16,
        enabled: bool,
    }

    impl PwmPin for Servo {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            20_000
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    type Wheel = HBridgeWheel<Pin, Pin, Servo>;

    fn wheel() -> Wheel {
        HBridgeWheel::new(Pin::default(), Pin::default(), Servo::default()).unwrap()
    }

    #[test]
    fn new_wheel_is_stopped_and_centred() {
        let wheel = wheel();
        assert_eq!(wheel.direction(), WheelDirection::Stopped);
        assert_eq!(wheel.steering_deg(), STEERING_CENTER_DEG);
        let (in1, in2, steer) = wheel.free();
        assert!(!in1.high && !in2.high);
        assert!(steer.enabled);
        // 1500 us out of a 20 ms frame at 1 us resolution
        assert_eq!(steer.duty, 1500);
    }

    #[test]
    fn directions_drive_the_expected_bridge_legs() {
        let mut wheel = wheel();

        wheel.set_direction(WheelDirection::Forward).unwrap();
        assert!(wheel.in1.high && !wheel.in2.high);

        wheel.set_direction(WheelDirection::Reverse).unwrap();
        assert!(!wheel.in1.high && wheel.in2.high);

        wheel.stop().unwrap();
        assert!(!wheel.in1.high && !wheel.in2.high);
    }

    #[test]
    fn steering_limits_are_enforced() {
        let mut wheel = wheel();
        wheel.set_steering_angle(60).unwrap();
        assert_eq!(wheel.steer.duty, 1166);
        assert_eq!(
            wheel.set_steering_angle(200),
            Err(DriverError::SteeringAngle(200))
        );
        assert_eq!(wheel.steering_deg(), 60);
    }

    #[test]
    fn pin_failure_surfaces_as_driver_error() {
        let mut wheel = wheel();
        wheel.in2.fail = true;
        assert_eq!(
            wheel.set_direction(WheelDirection::Reverse),
            Err(DriverError::WheelPin)
        );
    }

    #[test]
    fn infallible_pins_are_accepted() {
        struct Always;
        impl OutputPin for Always {
            type Error = Infallible;
            fn set_low(&mut self) -> Result<(), Infallible> {
                Ok(())
            }
            fn set_high(&mut self) -> Result<(), Infallible> {
                Ok(())
            }
        }
        let mut wheel = HBridgeWheel::new(Always, Always, Servo::default()).unwrap();
        assert!(wheel.set_direction(WheelDirection::Forward).is_ok());
    }
}
