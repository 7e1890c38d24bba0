// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Phase-table gait generator.
//!
//! A lightweight [`Kinematics`] implementation driving six three-joint legs directly in joint
//! space: coxa sweeps with the stride (or turn angle), femur lifts during the swing half of the
//! phase, tibia counters the femur to keep the foot under the hip. Legs 0..3 sit on chip A
//! (channels 0..9), legs 3..6 on chip B (channels 16..25). Unused channels hold neutral.
//!
//! Tripod groups {0, 2, 4} and {1, 3, 5} are half a cycle apart.

use core::f32::consts::PI;

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{CHANNEL_COUNT, CHIP_CHANNELS, MAX_PWM, MIN_PWM};
use crate::control::kinematics::{Kinematics, Targets};
use crate::control::locomotion::MotionIntent;

pub const LEG_COUNT: usize = 6;
pub const JOINTS_PER_LEG: usize = 3;

/// Phase steps in one full gait cycle.
pub const PHASES: u8 = 8;

/// Servo value at 90 degrees.
pub const NEUTRAL_PWM: i16 = (MIN_PWM + MAX_PWM) / 2;

const PWM_PER_DEG: f32 = (MAX_PWM - MIN_PWM) as f32 / 180.0;

// Joint-space gains
const STRIDE_DEG_PER_MM: f32 = 0.5;
const LIFT_DEG_PER_MM: f32 = 1.0;
const BODY_DEG_PER_MM: f32 = 0.5;

/// Logical channel of `joint` on `leg`.
#[inline]
pub fn joint_channel(leg: usize, joint: usize) -> usize {
    let half = LEG_COUNT / 2;
    if leg < half {
        leg * JOINTS_PER_LEG + joint
    } else {
        CHIP_CHANNELS + (leg - half) * JOINTS_PER_LEG + joint
    }
}

pub struct PhaseGait {
    intent: MotionIntent,
    phase: u8,
}

impl PhaseGait {
    pub const fn new() -> Self {
        Self {
            intent: MotionIntent::NEUTRAL,
            phase: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Phase angle of `leg` in radians, including its tripod group offset.
    fn leg_angle(&self, leg: usize) -> f32 {
        let base = 2.0 * PI * self.phase as f32 / PHASES as f32;
        if leg % 2 == 0 {
            base
        } else {
            base + PI
        }
    }

    /// Fill `out` from a per-leg coxa sweep amplitude in degrees.
    fn fill(&self, out: &mut Targets, sweep_deg: impl Fn(usize) -> f32) {
        *out = [NEUTRAL_PWM; CHANNEL_COUNT];

        let lift_deg = self.intent.lift * LIFT_DEG_PER_MM;
        let body_deg = self.intent.z * BODY_DEG_PER_MM;
        let lean_deg = self.intent.x * BODY_DEG_PER_MM;

        for leg in 0..LEG_COUNT {
            let theta = self.leg_angle(leg);
            let swing = theta.sin().max(0.0);

            let coxa = sweep_deg(leg) * theta.cos() + lean_deg;
            let femur = lift_deg * swing + body_deg;
            let tibia = -femur / 2.0;

            out[joint_channel(leg, 0)] = to_pwm(coxa);
            out[joint_channel(leg, 1)] = to_pwm(femur);
            out[joint_channel(leg, 2)] = to_pwm(tibia);
        }
    }
}

impl Default for PhaseGait {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn to_pwm(offset_deg: f32) -> i16 {
    let value = NEUTRAL_PWM as f32 + offset_deg * PWM_PER_DEG;
    value.round() as i16
}

impl Kinematics for PhaseGait {
    fn set_intent(&mut self, intent: &MotionIntent) {
        self.intent = *intent;
    }

    fn advance_phase(&mut self) {
        self.phase = (self.phase + 1) % PHASES;
    }

    fn walk(&mut self, out: &mut Targets) {
        let stride_deg = self.intent.y * STRIDE_DEG_PER_MM;
        // Right-hand legs (3..6) are mounted mirrored.
        self.fill(out, |leg| if leg < LEG_COUNT / 2 { stride_deg } else { -stride_deg });
    }

    fn circle(&mut self, out: &mut Targets) {
        let turn_deg = self.intent.angle;
        self.fill(out, |_| turn_deg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_FEET_LIFT, DEFAULT_LEG_STEP, DEFAULT_TURN_ANGLE};

    #[test]
    fn neutral_intent_holds_neutral_stance() {
        let mut gait = PhaseGait::new();
        let mut out = [0; CHANNEL_COUNT];
        for _ in 0..PHASES {
            gait.advance_phase();
            gait.walk(&mut out);
            assert!(out.iter().all(|&v| v == NEUTRAL_PWM));
        }
    }

    #[test]
    fn leg_channels_split_across_chips() {
        assert_eq!(joint_channel(0, 0), 0);
        assert_eq!(joint_channel(2, 2), 8);
        assert_eq!(joint_channel(3, 0), 16);
        assert_eq!(joint_channel(5, 2), 24);
    }

    #[test]
    fn phase_wraps_after_one_cycle() {
        let mut gait = PhaseGait::new();
        for _ in 0..PHASES {
            gait.advance_phase();
        }
        assert_eq!(gait.phase(), 0);
    }

    #[test]
    fn walking_moves_legs_and_stays_in_range() {
        let mut gait = PhaseGait::new();
        gait.set_intent(&MotionIntent {
            y: DEFAULT_LEG_STEP,
            lift: DEFAULT_FEET_LIFT,
            ..MotionIntent::NEUTRAL
        });

        let mut first = [0; CHANNEL_COUNT];
        let mut out = [0; CHANNEL_COUNT];
        gait.walk(&mut first);
        assert_ne!(first[joint_channel(0, 0)], NEUTRAL_PWM);
        // mirrored sides sweep in opposite directions
        assert_eq!(
            first[joint_channel(0, 0)] - NEUTRAL_PWM,
            NEUTRAL_PWM - first[joint_channel(4, 0)]
        );

        for _ in 0..PHASES {
            gait.advance_phase();
            gait.walk(&mut out);
            assert!(out.iter().all(|&v| (MIN_PWM..=MAX_PWM).contains(&v)));
        }
        assert_eq!(out, first);
    }

    #[test]
    fn circle_uses_turn_angle() {
        let mut gait = PhaseGait::new();
        gait.set_intent(&MotionIntent {
            angle: DEFAULT_TURN_ANGLE,
            lift: DEFAULT_FEET_LIFT,
            ..MotionIntent::NEUTRAL
        });
        let mut out = [0; CHANNEL_COUNT];
        gait.circle(&mut out);
        // phase 0: cos = 1 for group A, -1 for group B
        assert_eq!(out[joint_channel(0, 0)], to_pwm(DEFAULT_TURN_ANGLE));
        assert_eq!(out[joint_channel(1, 0)], to_pwm(-DEFAULT_TURN_ANGLE));
    }
}
