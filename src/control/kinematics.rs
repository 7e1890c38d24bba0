// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Contract for the leg trajectory engine that turns motion intent into servo targets.

use crate::config::CHANNEL_COUNT;
use crate::control::locomotion::MotionIntent;

/// Raw servo target for every logical channel. May be out of range; the servo engine clamps.
pub type Targets = [i16; CHANNEL_COUNT];

/// Leg kinematics / gait engine.
///
/// Called from the motion tick, once per ramp cycle. Each call must finish well within one tick
/// period; there is no timeout or retry if it does not.
pub trait Kinematics {
    /// Latch the operator deltas for the next gait step.
    fn set_intent(&mut self, intent: &MotionIntent);

    /// Advance the internal gait phase sequence by one step.
    fn advance_phase(&mut self);

    /// Standard (tripod) walk targets for the current phase.
    fn walk(&mut self, out: &mut Targets);

    /// Rotation-in-place targets for the current phase.
    fn circle(&mut self, out: &mut Targets);
}
