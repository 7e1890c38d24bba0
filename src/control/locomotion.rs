// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Locomotion mode, gait selection and operator motion intent.
//!
//! [`LocomotionState`] and [`MotionIntent`] are owned by the motion scheduler and only written
//! from the motion tick. The background loop reads a [`LocomotionSnapshot`], which the tick
//! republishes once per period and which may therefore be one tick stale.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{DEFAULT_SPEED_MS, MAX_SPEED_MS, MIN_SPEED_MS};

/// How the robot moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkMode {
    /// Six legs, driven through the servo engine.
    Legged,
    /// Wheel motor and steering servo, legs hold their last pose.
    Wheeled,
}

/// Leg-motion pattern used by the kinematics collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GaitVariant {
    /// Tripod walk, used for forward/backward stepping.
    Tripod,
    /// Rotation in place about the body centre.
    Circular,
}

/// Operator-requested deltas for the current gait cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MotionIntent {
    /// Forward/back body shift.
    pub x: f32,
    /// Lateral stride; FORWARD and BACKWARD drive this axis.
    pub y: f32,
    /// Vertical body shift.
    pub z: f32,
    /// Turn angle per gait cycle, degrees.
    pub angle: f32,
    /// Foot lift height.
    pub lift: f32,
}

impl MotionIntent {
    pub const NEUTRAL: MotionIntent = MotionIntent {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        angle: 0.0,
        lift: 0.0,
    };

    #[inline]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocomotionState {
    pub mode: WalkMode,
    pub gait: GaitVariant,
    /// Duration of one ramp cycle in milliseconds.
    nominal_speed_ms: u16,
}

impl LocomotionState {
    pub const fn new() -> Self {
        Self {
            mode: WalkMode::Legged,
            gait: GaitVariant::Tripod,
            nominal_speed_ms: DEFAULT_SPEED_MS,
        }
    }

    #[inline]
    pub fn nominal_speed_ms(&self) -> u16 {
        self.nominal_speed_ms
    }

    /// Set the nominal speed, clamped to the supported range. Returns the applied value.
    pub fn set_nominal_speed_ms(&mut self, ms: u16) -> u16 {
        let applied = ms.clamp(MIN_SPEED_MS, MAX_SPEED_MS);
        if applied != ms {
            log::warn!("speed {} ms out of range, using {} ms", ms, applied);
        }
        self.nominal_speed_ms = applied;
        applied
    }

    #[inline]
    pub fn is_legged(&self) -> bool {
        self.mode == WalkMode::Legged
    }
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer reload value that makes one `steps_per_cycle` ramp last `speed_ms`.
///
/// The motion timer counts at [`MOTION_TIMER_BASE_HZ`](crate::config::MOTION_TIMER_BASE_HZ),
/// so one count is 100 us.
pub fn motion_timer_reload(speed_ms: u16, steps_per_cycle: u8) -> u16 {
    let counts_per_ms = crate::config::MOTION_TIMER_BASE_HZ / 1000;
    let reload = speed_ms as u32 * counts_per_ms / steps_per_cycle.max(1) as u32;
    reload.clamp(1, u16::MAX as u32) as u16
}

/// Lock-free copy of [`LocomotionState`] for readers outside the motion tick.
///
/// Mode, gait and speed share one word so a reader never mixes fields from different ticks.
///
/// ```text
/// bits 0..16   nominal speed, ms
/// bit  16      mode (1 = wheeled)
/// bit  17      gait (1 = circular)
/// ```
pub struct LocomotionSnapshot {
    packed: AtomicU32,
}

const MODE_BIT: u32 = 1 << 16;
const GAIT_BIT: u32 = 1 << 17;

impl LocomotionSnapshot {
    pub const fn new() -> Self {
        Self {
            packed: AtomicU32::new(DEFAULT_SPEED_MS as u32),
        }
    }

    fn pack(state: &LocomotionState) -> u32 {
        let mut word = state.nominal_speed_ms as u32;
        if state.mode == WalkMode::Wheeled {
            word |= MODE_BIT;
        }
        if state.gait == GaitVariant::Circular {
            word |= GAIT_BIT;
        }
        word
    }

    /// Called by the single writer (the motion tick).
    pub fn publish(&self, state: &LocomotionState) {
        self.packed.store(Self::pack(state), Ordering::Release);
    }

    pub fn load(&self) -> LocomotionState {
        let word = self.packed.load(Ordering::Acquire);
        LocomotionState {
            mode: if word & MODE_BIT != 0 {
                WalkMode::Wheeled
            } else {
                WalkMode::Legged
            },
            gait: if word & GAIT_BIT != 0 {
                GaitVariant::Circular
            } else {
                GaitVariant::Tripod
            },
            nominal_speed_ms: word as u16,
        }
    }
}

impl Default for LocomotionSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boots_legged_tripod_at_default_speed() {
        let state = LocomotionState::new();
        assert_eq!(state.mode, WalkMode::Legged);
        assert_eq!(state.gait, GaitVariant::Tripod);
        assert_eq!(state.nominal_speed_ms(), DEFAULT_SPEED_MS);
    }

    #[test]
    fn speed_is_bounded() {
        let mut state = LocomotionState::new();
        assert_eq!(state.set_nominal_speed_ms(10), MIN_SPEED_MS);
        assert_eq!(state.set_nominal_speed_ms(60_000), MAX_SPEED_MS);
        assert_eq!(state.set_nominal_speed_ms(500), 500);
    }

    #[test]
    fn reload_spreads_one_cycle_over_nominal_speed() {
        // 400 ms over 10 steps = 40 ms per tick = 400 counts at 10 kHz
        assert_eq!(motion_timer_reload(400, 10), 400);
        assert_eq!(motion_timer_reload(100, 10), 100);
        assert_eq!(motion_timer_reload(0, 10), 1);
    }

    #[test]
    fn snapshot_round_trips_published_state() {
        let snapshot = LocomotionSnapshot::new();
        assert_eq!(snapshot.load(), LocomotionState::new());

        let mut state = LocomotionState::new();
        state.mode = WalkMode::Wheeled;
        state.gait = GaitVariant::Circular;
        state.set_nominal_speed_ms(750);
        snapshot.publish(&state);

        assert_eq!(snapshot.load(), state);
    }

    #[test]
    fn snapshot_word_carries_every_field_at_once() {
        let snapshot = LocomotionSnapshot::new();
        let mut state = LocomotionState::new();
        state.mode = WalkMode::Wheeled;
        state.set_nominal_speed_ms(MAX_SPEED_MS);
        snapshot.publish(&state);

        let word = snapshot.packed.load(Ordering::Relaxed);
        assert_eq!(word, MAX_SPEED_MS as u32 | MODE_BIT);

        state.mode = WalkMode::Legged;
        state.gait = GaitVariant::Circular;
        state.set_nominal_speed_ms(MIN_SPEED_MS);
        snapshot.publish(&state);
        assert_eq!(snapshot.load(), state);
    }
}
