// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command dispatcher: turns the latest command code into motion intent, mode changes or direct
//! wheel commands.
//!
//! The dispatcher runs once per motion tick against whatever code is in the mailbox, so every
//! effect here is idempotent. Legged-only commands are silently ignored in wheeled mode. Any
//! code that is not a motion command (including "nothing received") stops the wheel motor.

use crate::config::{
    DEFAULT_FEET_LIFT, DEFAULT_LEG_STEP, DEFAULT_TURN_ANGLE, STEERING_CENTER_DEG,
    STEERING_OFFSET_DEG,
};
use crate::control::locomotion::{GaitVariant, LocomotionState, MotionIntent, WalkMode};
use crate::drivers::{WheelDirection, WheelDriver};
use crate::error::DriverError;
use crate::protocol::messages::Command;

/// What a dispatch did, mostly for logging and tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// Motion intent (and possibly gait) rewritten.
    Intent,
    /// Legged-only command received in wheeled mode.
    Ignored,
    Mode(WalkMode),
    Wheel(WheelDirection),
    Steering(u8),
    /// Unknown, absent or non-motion code: wheel motor stopped.
    DefaultStop,
}

/// Maps one command code per tick onto motion intent, locomotion state and the wheel.
pub struct Dispatcher {
    last_code: u8,
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self { last_code: 0 }
    }

    /// Apply `code` to the motion state.
    pub fn dispatch<W: WheelDriver>(
        &mut self,
        code: u8,
        intent: &mut MotionIntent,
        state: &mut LocomotionState,
        wheels: &mut W,
    ) -> Result<DispatchOutcome, DriverError> {
        if code != self.last_code {
            log::debug!("command {:#04x} -> {:?}", code, Command::from_code(code));
            self.last_code = code;
        }

        let cmd = match Command::from_code(code) {
            Some(cmd) => cmd,
            None => return Self::default_stop(wheels),
        };

        if cmd.is_legged_only() && !state.is_legged() {
            return Ok(DispatchOutcome::Ignored);
        }

        let outcome = match cmd {
            Command::Stand => {
                *intent = MotionIntent::NEUTRAL;
                DispatchOutcome::Intent
            }
            Command::Forward | Command::Backward => {
                let step = if cmd == Command::Forward {
                    DEFAULT_LEG_STEP
                } else {
                    -DEFAULT_LEG_STEP
                };
                state.gait = GaitVariant::Tripod;
                *intent = MotionIntent {
                    y: step,
                    lift: DEFAULT_FEET_LIFT,
                    ..MotionIntent::NEUTRAL
                };
                DispatchOutcome::Intent
            }
            Command::TurnLeft | Command::TurnRight => {
                let angle = if cmd == Command::TurnLeft {
                    DEFAULT_TURN_ANGLE
                } else {
                    -DEFAULT_TURN_ANGLE
                };
                state.gait = GaitVariant::Circular;
                *intent = MotionIntent {
                    angle,
                    lift: DEFAULT_FEET_LIFT,
                    ..MotionIntent::NEUTRAL
                };
                DispatchOutcome::Intent
            }
            Command::WheelForward => Self::wheel(wheels, WheelDirection::Forward)?,
            Command::WheelBackward => Self::wheel(wheels, WheelDirection::Reverse)?,
            Command::WheelStop => Self::wheel(wheels, WheelDirection::Stopped)?,
            Command::ModeWheeled => Self::switch_mode(state, WalkMode::Wheeled),
            Command::ModeLegged => {
                wheels.stop()?;
                Self::switch_mode(state, WalkMode::Legged)
            }
            Command::SteerLeft => {
                Self::steer(wheels, STEERING_CENTER_DEG - STEERING_OFFSET_DEG)?
            }
            Command::SteerRight => {
                Self::steer(wheels, STEERING_CENTER_DEG + STEERING_OFFSET_DEG)?
            }
            Command::MeasureStart | Command::MeasureStop => Self::default_stop(wheels)?,
        };

        Ok(outcome)
    }

    fn default_stop<W: WheelDriver>(wheels: &mut W) -> Result<DispatchOutcome, DriverError> {
        wheels.stop()?;
        Ok(DispatchOutcome::DefaultStop)
    }

    fn wheel<W: WheelDriver>(
        wheels: &mut W,
        direction: WheelDirection,
    ) -> Result<DispatchOutcome, DriverError> {
        wheels.set_direction(direction)?;
        Ok(DispatchOutcome::Wheel(direction))
    }

    fn steer<W: WheelDriver>(wheels: &mut W, degrees: u8) -> Result<DispatchOutcome, DriverError> {
        wheels.set_steering_angle(degrees)?;
        Ok(DispatchOutcome::Steering(degrees))
    }

    fn switch_mode(state: &mut LocomotionState, mode: WalkMode) -> DispatchOutcome {
        if state.mode != mode {
            log::info!("walk mode {:?} -> {:?}", state.mode, mode);
            state.mode = mode;
        }
        DispatchOutcome::Mode(mode)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::*;

    #[derive(Default)]
    struct Wheels {
        direction: Option<WheelDirection>,
        steering: Option<u8>,
        stops: u32,
        fail: bool,
    }

    impl WheelDriver for Wheels {
        fn set_direction(&mut self, direction: WheelDirection) -> Result<(), DriverError> {
            if self.fail {
                return Err(DriverError::WheelPin);
            }
            if direction == WheelDirection::Stopped {
                self.stops += 1;
            }
            self.direction = Some(direction);
            Ok(())
        }

        fn set_steering_angle(&mut self, degrees: u8) -> Result<(), DriverError> {
            self.steering = Some(degrees);
            Ok(())
        }
    }

    struct Rig {
        dispatcher: Dispatcher,
        intent: MotionIntent,
        state: LocomotionState,
        wheels: Wheels,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                dispatcher: Dispatcher::new(),
                intent: MotionIntent::NEUTRAL,
                state: LocomotionState::new(),
                wheels: Wheels::default(),
            }
        }

        fn send(&mut self, code: u8) -> DispatchOutcome {
            self.dispatcher
                .dispatch(code, &mut self.intent, &mut self.state, &mut self.wheels)
                .unwrap()
        }
    }

    #[test]
    fn forward_and_backward_select_tripod_stride() {
        let mut rig = Rig::new();
        rig.state.gait = GaitVariant::Circular;

        assert_eq!(rig.send(CMD_FORWARD), DispatchOutcome::Intent);
        assert_eq!(rig.state.gait, GaitVariant::Tripod);
        assert_eq!(
            rig.intent,
            MotionIntent {
                y: DEFAULT_LEG_STEP,
                lift: DEFAULT_FEET_LIFT,
                ..MotionIntent::NEUTRAL
            }
        );

        rig.send(CMD_BACKWARD);
        assert_eq!(rig.intent.y, -DEFAULT_LEG_STEP);
    }

    #[test]
    fn turn_overwrites_forward_intent() {
        let mut rig = Rig::new();
        rig.send(CMD_FORWARD);
        rig.send(CMD_TURN_LEFT);

        assert_eq!(rig.state.gait, GaitVariant::Circular);
        assert_eq!(rig.intent.angle, DEFAULT_TURN_ANGLE);
        assert_eq!(rig.intent.y, 0.0);
        assert_eq!(rig.intent.lift, DEFAULT_FEET_LIFT);

        rig.send(CMD_TURN_RIGHT);
        assert_eq!(rig.intent.angle, -DEFAULT_TURN_ANGLE);
    }

    #[test]
    fn stand_zeroes_intent() {
        let mut rig = Rig::new();
        rig.send(CMD_FORWARD);
        rig.send(CMD_STAND);
        assert!(rig.intent.is_neutral());
    }

    #[test]
    fn legged_commands_are_ignored_in_wheeled_mode() {
        let mut rig = Rig::new();
        rig.send(CMD_TURN_LEFT);
        rig.send(CMD_MODE_WHEELED);
        assert_eq!(rig.state.mode, WalkMode::Wheeled);

        let before = rig.intent;
        let gait = rig.state.gait;
        for code in [CMD_FORWARD, CMD_BACKWARD, CMD_STAND, CMD_TURN_RIGHT] {
            assert_eq!(rig.send(code), DispatchOutcome::Ignored);
        }
        assert_eq!(rig.intent, before);
        assert_eq!(rig.state.gait, gait);
    }

    #[test]
    fn wheel_commands_work_in_any_mode() {
        let mut rig = Rig::new();
        rig.send(CMD_WHEEL_FORWARD);
        assert_eq!(rig.wheels.direction, Some(WheelDirection::Forward));

        rig.send(CMD_MODE_WHEELED);
        rig.send(CMD_WHEEL_BACKWARD);
        assert_eq!(rig.wheels.direction, Some(WheelDirection::Reverse));
        rig.send(CMD_WHEEL_STOP);
        assert_eq!(rig.wheels.direction, Some(WheelDirection::Stopped));
        // intent untouched by wheel commands
        assert!(rig.intent.is_neutral());
    }

    #[test]
    fn switching_to_legged_stops_the_wheel() {
        let mut rig = Rig::new();
        rig.send(CMD_MODE_WHEELED);
        rig.send(CMD_WHEEL_FORWARD);

        assert_eq!(rig.send(CMD_MODE_LEGGED), DispatchOutcome::Mode(WalkMode::Legged));
        assert_eq!(rig.state.mode, WalkMode::Legged);
        assert_eq!(rig.wheels.direction, Some(WheelDirection::Stopped));
    }

    #[test]
    fn steering_offsets_from_centre() {
        let mut rig = Rig::new();
        assert_eq!(rig.send(CMD_STEER_LEFT), DispatchOutcome::Steering(60));
        assert_eq!(rig.send(CMD_STEER_RIGHT), DispatchOutcome::Steering(120));
        assert_eq!(rig.wheels.steering, Some(120));
    }

    #[test]
    fn unknown_and_absent_codes_stop_the_wheel() {
        let mut rig = Rig::new();
        rig.send(CMD_WHEEL_FORWARD);

        for code in [CMD_NONE, 0x7F, CMD_MEASURE_START, CMD_NONE] {
            assert_eq!(rig.send(code), DispatchOutcome::DefaultStop);
            assert_eq!(rig.wheels.direction, Some(WheelDirection::Stopped));
        }
        assert_eq!(rig.wheels.stops, 4);
        assert!(rig.intent.is_neutral());
    }

    #[test]
    fn wheel_fault_propagates() {
        let mut rig = Rig::new();
        rig.wheels.fail = true;
        let res = rig
            .dispatcher
            .dispatch(CMD_WHEEL_FORWARD, &mut rig.intent, &mut rig.state, &mut rig.wheels);
        assert_eq!(res, Err(DriverError::WheelPin));
    }
}
