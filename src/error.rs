// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error types shared by the motion core.
//!
//! Only clamping is recoverable, and it is not an error. Everything that reaches one of these
//! types ends in the scheduler's `Halted` state.

use crate::drivers::Chip;

/// A single-channel PWM expander write failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("PWM write to chip {chip:?} channel {channel} failed")]
pub struct SinkError {
    pub chip: Chip,
    /// Channel index local to `chip` (0..16).
    pub channel: u8,
}

/// Failure of a direct actuator collaborator (wheel motor, steering servo, beeper).
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("wheel direction pin write failed")]
    WheelPin,

    #[error("steering servo angle {0} out of range")]
    SteeringAngle(u8),

    #[error("beeper pin write failed")]
    BeeperPin,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    /// The scheduler is in its terminal state; only a reset recovers.
    #[error("motion core halted")]
    Halted,

    #[error("peripheral init failed: {0}")]
    Init(&'static str),
}
