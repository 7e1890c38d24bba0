// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Motion Control
//!
//! Everything that runs in (or feeds) the fixed-period motion tick.
//!
//! ## Modules
//!
//! - [`servo`] - Per-channel linear ramp engine with look-ahead refresh flag.
//! - [`scheduler`] - Motion tick pipeline: heartbeat, dispatch, kinematics refresh, ramp.
//! - [`locomotion`] - Walk mode, gait variant, motion intent and nominal speed.
//! - [`kinematics`] - Collaborator trait producing servo target arrays.
//! - [`gait`] - Phase-table hexapod gait implementing [`Kinematics`].
//! - [`battery`] - Battery voltage sampling and low-voltage latch.

pub mod battery;
pub mod gait;
pub mod kinematics;
pub mod locomotion;
pub mod scheduler;
pub mod servo;

pub use battery::{BatteryEvent, BatteryGuard, BatteryLevel};
pub use gait::PhaseGait;
pub use kinematics::{Kinematics, Targets};
pub use locomotion::{GaitVariant, LocomotionSnapshot, LocomotionState, MotionIntent, WalkMode};
pub use scheduler::{Heartbeat, MotionScheduler, SchedulerState, TickReport};
pub use servo::{ServoChannel, ServoEngine};
