// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command codes used to drive the robot over the byte-oriented command channel.

/// Sync byte for the protocol.
pub const START_BYTE: u8 = 0xA5;

/// Nothing received yet.
pub const CMD_NONE: u8 = 0x00;

// Legged motion
pub const CMD_STAND: u8 = 0x01;
pub const CMD_FORWARD: u8 = 0x02;
pub const CMD_BACKWARD: u8 = 0x03;
pub const CMD_TURN_LEFT: u8 = 0x04;
pub const CMD_TURN_RIGHT: u8 = 0x05;

// Wheel motor
pub const CMD_WHEEL_FORWARD: u8 = 0x10;
pub const CMD_WHEEL_BACKWARD: u8 = 0x11;
pub const CMD_WHEEL_STOP: u8 = 0x12;

// Mode switch
pub const CMD_MODE_WHEELED: u8 = 0x20;
pub const CMD_MODE_LEGGED: u8 = 0x21;

// Steering servo
pub const CMD_STEER_LEFT: u8 = 0x30;
pub const CMD_STEER_RIGHT: u8 = 0x31;

// Gas sensor (background loop only)
pub const CMD_MEASURE_START: u8 = 0x40;
pub const CMD_MEASURE_STOP: u8 = 0x41;

/// Decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stand,
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    WheelForward,
    WheelBackward,
    WheelStop,
    ModeWheeled,
    ModeLegged,
    SteerLeft,
    SteerRight,
    MeasureStart,
    MeasureStop,
}

impl Command {
    /// Decode a wire code. `None` for [`CMD_NONE`] and unknown codes.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            CMD_STAND => Command::Stand,
            CMD_FORWARD => Command::Forward,
            CMD_BACKWARD => Command::Backward,
            CMD_TURN_LEFT => Command::TurnLeft,
            CMD_TURN_RIGHT => Command::TurnRight,
            CMD_WHEEL_FORWARD => Command::WheelForward,
            CMD_WHEEL_BACKWARD => Command::WheelBackward,
            CMD_WHEEL_STOP => Command::WheelStop,
            CMD_MODE_WHEELED => Command::ModeWheeled,
            CMD_MODE_LEGGED => Command::ModeLegged,
            CMD_STEER_LEFT => Command::SteerLeft,
            CMD_STEER_RIGHT => Command::SteerRight,
            CMD_MEASURE_START => Command::MeasureStart,
            CMD_MEASURE_STOP => Command::MeasureStop,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        match self {
            Command::Stand => CMD_STAND,
            Command::Forward => CMD_FORWARD,
            Command::Backward => CMD_BACKWARD,
            Command::TurnLeft => CMD_TURN_LEFT,
            Command::TurnRight => CMD_TURN_RIGHT,
            Command::WheelForward => CMD_WHEEL_FORWARD,
            Command::WheelBackward => CMD_WHEEL_BACKWARD,
            Command::WheelStop => CMD_WHEEL_STOP,
            Command::ModeWheeled => CMD_MODE_WHEELED,
            Command::ModeLegged => CMD_MODE_LEGGED,
            Command::SteerLeft => CMD_STEER_LEFT,
            Command::SteerRight => CMD_STEER_RIGHT,
            Command::MeasureStart => CMD_MEASURE_START,
            Command::MeasureStop => CMD_MEASURE_STOP,
        }
    }

    /// Commands that only act in legged mode.
    pub fn is_legged_only(self) -> bool {
        matches!(
            self,
            Command::Stand
                | Command::Forward
                | Command::Backward
                | Command::TurnLeft
                | Command::TurnRight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_decode_to_their_command() {
        for code in 0u8..=0xFF {
            if let Some(cmd) = Command::from_code(code) {
                assert_eq!(cmd.code(), code);
            }
        }
        assert_eq!(Command::from_code(CMD_NONE), None);
        assert_eq!(Command::from_code(0x7F), None);
        assert_eq!(Command::from_code(CMD_TURN_RIGHT), Some(Command::TurnRight));
    }
}
