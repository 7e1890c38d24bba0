// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion scheduler: the fixed-period control tick.
//!
//! Each tick, in order:
//! 1. toggle the heartbeat
//! 2. dispatch the latest command code
//! 3. if the engine raised its look-ahead flag last tick, ask the kinematics collaborator for
//!    a fresh target array (circular or walk calculation by gait)
//! 4. advance the servo engine, which reloads/emits as needed
//!
//! Any sink or actuator failure moves the scheduler into [`SchedulerState::Halted`], which only a
//! reset leaves.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! let reload = scheduler.start()?;
//! timer.set_reload(reload);
//!
//! // motion timer interrupt
//! scheduler.tick(mailbox.latest())?;
//! ```

use crate::config::RampConfig;
use crate::control::kinematics::{Kinematics, Targets};
use crate::control::locomotion::{
    motion_timer_reload, GaitVariant, LocomotionState, MotionIntent,
};
use crate::control::servo::ServoEngine;
use crate::drivers::{PwmSink, WheelDriver};
use crate::error::CoreError;
use crate::protocol::{DispatchOutcome, Dispatcher};

/// Liveness indicator toggled once per tick.
pub trait Heartbeat {
    fn toggle(&mut self);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Built but [`MotionScheduler::start`] not called yet.
    Idle,
    Running,
    /// Terminal. Output frozen, wheel motor stopped.
    Halted,
}

/// What happened during one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickReport {
    pub dispatch: DispatchOutcome,
    /// Kinematics produced a new target array this tick.
    pub refreshed: bool,
    /// Look-ahead flag raised by the engine for the next tick.
    pub ramp_complete: bool,
}

/// Fixed-period motion tick: dispatch, target refresh and servo ramp in one pass.
pub struct MotionScheduler<S, K, W, H> {
    state: SchedulerState,
    dispatcher: Dispatcher,
    intent: MotionIntent,
    locomotion: LocomotionState,
    engine: ServoEngine,
    targets: Targets,
    ticks: u32,

    sink: S,
    kinematics: K,
    wheels: W,
    heartbeat: H,
}

impl<S, K, W, H> MotionScheduler<S, K, W, H>
where
    S: PwmSink,
    K: Kinematics,
    W: WheelDriver,
    H: Heartbeat,
{
    pub fn new(config: RampConfig, sink: S, kinematics: K, wheels: W, heartbeat: H) -> Self {
        Self {
            state: SchedulerState::Idle,
            dispatcher: Dispatcher::new(),
            intent: MotionIntent::NEUTRAL,
            locomotion: LocomotionState::new(),
            engine: ServoEngine::new(config),
            targets: [0; crate::config::CHANNEL_COUNT],
            ticks: 0,
            sink,
            kinematics,
            wheels,
            heartbeat,
        }
    }

    /// Compute the neutral stance, prime the engine with one tick and go to `Running`.
    ///
    /// Returns the motion timer reload for the nominal speed.
    pub fn start(&mut self) -> Result<u16, CoreError> {
        match self.state {
            SchedulerState::Idle => {}
            SchedulerState::Running => return Ok(self.timer_reload()),
            SchedulerState::Halted => return Err(CoreError::Halted),
        }

        self.kinematics.set_intent(&self.intent);
        self.kinematics.walk(&mut self.targets);

        if let Err(e) = self.engine.tick(&self.targets, &mut self.sink) {
            return Err(self.halt(e));
        }

        self.state = SchedulerState::Running;
        log::info!(
            "motion core running, {} ms per ramp cycle",
            self.locomotion.nominal_speed_ms()
        );
        Ok(self.timer_reload())
    }

    /// One control tick. Must not be re-entered.
    pub fn tick(&mut self, code: u8) -> Result<TickReport, CoreError> {
        match self.state {
            SchedulerState::Running => {}
            SchedulerState::Halted => return Err(CoreError::Halted),
            SchedulerState::Idle => return Err(CoreError::Init("motion tick before start")),
        }

        self.heartbeat.toggle();

        let dispatch = match self.dispatcher.dispatch(
            code,
            &mut self.intent,
            &mut self.locomotion,
            &mut self.wheels,
        ) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.halt(e.into())),
        };

        let refreshed = self.engine.ramp_complete();
        if refreshed {
            self.refresh_targets();
        }

        let ramp_complete = match self.engine.tick(&self.targets, &mut self.sink) {
            Ok(flag) => flag,
            Err(e) => return Err(self.halt(e)),
        };

        self.ticks = self.ticks.wrapping_add(1);

        Ok(TickReport {
            dispatch,
            refreshed,
            ramp_complete,
        })
    }

    fn refresh_targets(&mut self) {
        self.kinematics.set_intent(&self.intent);
        self.kinematics.advance_phase();

        match self.locomotion.gait {
            GaitVariant::Circular => self.kinematics.circle(&mut self.targets),
            GaitVariant::Tripod => self.kinematics.walk(&mut self.targets),
        }
    }

    /// Change the ramp cycle duration. Returns the new motion timer reload.
    pub fn set_nominal_speed(&mut self, speed_ms: u16) -> u16 {
        self.locomotion.set_nominal_speed_ms(speed_ms);
        self.timer_reload()
    }

    #[inline]
    pub fn timer_reload(&self) -> u16 {
        motion_timer_reload(
            self.locomotion.nominal_speed_ms(),
            self.engine.config().steps_per_cycle,
        )
    }

    /// Operator or safety stop: freeze output and stop the wheel motor. Permanent.
    ///
    /// The wheel stop is attempted on every call, so a failed one can be retried.
    pub fn stop(&mut self) -> Result<(), CoreError> {
        if self.state != SchedulerState::Halted {
            log::warn!("motion stop requested after {} ticks", self.ticks);
            self.state = SchedulerState::Halted;
        }
        self.wheels.stop().map_err(|e| {
            log::error!("wheel stop failed: {}", e);
            CoreError::from(e)
        })
    }

    fn halt(&mut self, err: CoreError) -> CoreError {
        log::error!("{}, motion halted", err);
        self.state = SchedulerState::Halted;
        if let Err(e) = self.wheels.stop() {
            log::error!("wheel stop after halt failed: {}", e);
        }
        err
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state == SchedulerState::Halted
    }

    #[inline]
    pub fn intent(&self) -> &MotionIntent {
        &self.intent
    }

    #[inline]
    pub fn locomotion(&self) -> &LocomotionState {
        &self.locomotion
    }

    #[inline]
    pub fn engine(&self) -> &ServoEngine {
        &self.engine
    }

    /// Target array the engine will consume at the next reload.
    #[inline]
    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn wheels(&self) -> &W {
        &self.wheels
    }
}
