// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Multi-channel servo interpolation engine.
//!
//! Every output moves linearly from its previous anchor to its target over a fixed number of
//! ticks. One counter is shared by all channels:
//!
//! ```text
//! tick:  counter += 1
//!        counter <  steps  -> current += increment
//!        counter >= steps  -> current  = target           (snap, no residual)
//!        counter >= steps  -> counter = 0, anchor = current,
//!                             target = clamp(next), increment = (target - anchor) / steps
//!        ramp_complete = counter == steps - 1              (one tick look-ahead)
//!        emit all outputs
//! ```
//!
//! `ramp_complete` tells the caller to compute the next target array now; it is consumed on the
//! following tick, so computing and consuming overlap without a stall.
//!
//! A failed sink write freezes the engine permanently.

use crate::config::{RampConfig, CHANNEL_COUNT};
use crate::drivers::PwmSink;
use crate::error::CoreError;

/// Ramp state of one servo channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServoChannel {
    /// Value written to the sink on the last tick.
    pub current: i16,
    /// Output at the start of the running ramp cycle.
    pub anchor: i16,
    /// Clamped end point of the running ramp cycle.
    pub target: i16,
    /// Per-tick step, truncated toward zero.
    pub increment: i16,
}

impl ServoChannel {
    #[inline]
    fn advance(&mut self) {
        self.current = self.current.saturating_add(self.increment);
    }

    #[inline]
    fn snap(&mut self) {
        self.current = self.target;
    }

    /// Start a new ramp cycle from the current output. Returns `true` if `requested` was clamped.
    fn reload(&mut self, requested: i16, config: &RampConfig) -> bool {
        self.anchor = self.current;
        self.target = requested.clamp(config.min_pwm, config.max_pwm);
        let delta = self.target as i32 - self.anchor as i32;
        self.increment = (delta / config.steps_per_cycle as i32) as i16;
        self.target != requested
    }
}

/// Linear ramp engine for all servo channels, sharing one step counter.
pub struct ServoEngine {
    config: RampConfig,
    channels: [ServoChannel; CHANNEL_COUNT],
    counter: u8,
    ramp_complete: bool,
    halted: bool,
    clamp_events: u32,
}

impl ServoEngine {
    /// All channels start at zero; the first reload happens after one full cycle.
    pub fn new(config: RampConfig) -> Self {
        debug_assert!(config.steps_per_cycle >= 2);
        debug_assert!(config.min_pwm <= config.max_pwm);
        Self {
            config,
            channels: [ServoChannel::default(); CHANNEL_COUNT],
            counter: 0,
            ramp_complete: false,
            halted: false,
            clamp_events: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &ServoChannel {
        &self.channels[index]
    }

    #[inline]
    pub fn channels(&self) -> &[ServoChannel; CHANNEL_COUNT] {
        &self.channels
    }

    /// Current output of every channel.
    pub fn outputs(&self) -> [i16; CHANNEL_COUNT] {
        let mut out = [0; CHANNEL_COUNT];
        for (o, ch) in out.iter_mut().zip(self.channels.iter()) {
            *o = ch.current;
        }
        out
    }

    #[inline]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// True when the running cycle finishes on the next tick.
    #[inline]
    pub fn ramp_complete(&self) -> bool {
        self.ramp_complete
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of channel targets clamped since boot.
    #[inline]
    pub fn clamp_events(&self) -> u32 {
        self.clamp_events
    }

    /// Advance every channel by one tick and emit the sample.
    ///
    /// `targets` is only read on the tick that closes a ramp cycle. Returns the look-ahead flag.
    pub fn tick<S: PwmSink>(
        &mut self,
        targets: &[i16; CHANNEL_COUNT],
        sink: &mut S,
    ) -> Result<bool, CoreError> {
        if self.halted {
            return Err(CoreError::Halted);
        }

        let steps = self.config.steps_per_cycle;
        self.counter = self.counter.saturating_add(1);

        if self.counter < steps {
            self.channels.iter_mut().for_each(ServoChannel::advance);
        } else {
            self.channels.iter_mut().for_each(ServoChannel::snap);
        }

        #[cfg(feature = "servo-debug")]
        log::trace!(
            "servo0 counter={} current={} target={} increment={}",
            self.counter,
            self.channels[0].current,
            self.channels[0].target,
            self.channels[0].increment
        );

        if self.counter >= steps {
            self.counter = 0;
            self.reload(targets);
        }

        self.ramp_complete = self.counter == steps - 1;

        let outputs = self.outputs();
        if let Err(e) = sink.write_all(&outputs) {
            log::error!("{}, servo output frozen until reset", e);
            self.halted = true;
            return Err(e.into());
        }

        Ok(self.ramp_complete)
    }

    fn reload(&mut self, targets: &[i16; CHANNEL_COUNT]) {
        let config = self.config;
        for (i, (ch, &requested)) in self.channels.iter_mut().zip(targets.iter()).enumerate() {
            if ch.reload(requested, &config) {
                self.clamp_events = self.clamp_events.wrapping_add(1);
                log::warn!(
                    "servo {} target {} outside [{}, {}], clamped to {}",
                    i,
                    requested,
                    config.min_pwm,
                    config.max_pwm,
                    ch.target
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Chip;
    use crate::error::SinkError;
    use std::format;
    use std::string::String;
    use std::sync::Mutex;
    use std::vec::Vec;

    const RAMP: RampConfig = RampConfig {
        min_pwm: 1000,
        max_pwm: 4000,
        steps_per_cycle: 10,
    };

    /// Records every emitted sample.
    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<[u16; CHANNEL_COUNT]>,
        pending: [u16; CHANNEL_COUNT],
        fail_on_frame: Option<usize>,
    }

    impl PwmSink for RecordingSink {
        fn write_channel(&mut self, channel: usize, on: u16, off: u16) -> Result<(), SinkError> {
            assert_eq!(on, 0);
            if self.fail_on_frame == Some(self.frames.len()) {
                let (chip, channel) = Chip::locate(channel);
                return Err(SinkError { chip, channel });
            }
            self.pending[channel] = off;
            if channel == CHANNEL_COUNT - 1 {
                self.frames.push(self.pending);
            }
            Ok(())
        }
    }

    fn run(engine: &mut ServoEngine, sink: &mut RecordingSink, targets: &[i16; CHANNEL_COUNT], n: usize) {
        for _ in 0..n {
            engine.tick(targets, sink).unwrap();
        }
    }

    /// Engine whose channels all sit exactly at `value` with a fresh cycle just started.
    fn settled_at(value: i16) -> (ServoEngine, RecordingSink) {
        let mut engine = ServoEngine::new(RAMP);
        let mut sink = RecordingSink::default();
        run(&mut engine, &mut sink, &[value; CHANNEL_COUNT], 20);
        assert_eq!(engine.counter(), 0);
        assert!(engine.outputs().iter().all(|&v| v == value));
        (engine, sink)
    }

    #[test]
    fn full_range_ramp_snaps_exactly() {
        let (mut engine, mut sink) = settled_at(1000);

        // The cycle that just started is a hold at 1000; queue 4000 for the next reload.
        let target = [4000; CHANNEL_COUNT];
        run(&mut engine, &mut sink, &target, 10);
        let ch = *engine.channel(0);
        assert_eq!(ch.anchor, 1000);
        assert_eq!(ch.target, 4000);
        assert_eq!(ch.increment, 300);

        run(&mut engine, &mut sink, &target, 9);
        assert_eq!(engine.channel(0).current, 1000 + 9 * 300);

        run(&mut engine, &mut sink, &target, 1);
        assert_eq!(engine.channel(0).current, 4000);
        assert_eq!(sink.frames.last().unwrap()[0], 4000);
    }

    #[test]
    fn convergence_is_exact_for_uneven_deltas() {
        let (mut engine, mut sink) = settled_at(1000);

        let mut targets = [0i16; CHANNEL_COUNT];
        for (i, t) in targets.iter_mut().enumerate() {
            // mix of signs and deltas not divisible by the step count
            *t = if i % 2 == 0 { 1000 + 7 * i as i16 + 3 } else { 3997 - 13 * i as i16 };
        }

        run(&mut engine, &mut sink, &targets, 10);
        run(&mut engine, &mut sink, &[2500; CHANNEL_COUNT], 10);

        assert_eq!(engine.outputs(), targets);
        // the engine has already reloaded toward 2500; the old targets left no residue
        assert!(engine.channels().iter().all(|c| c.anchor == c.current));
    }

    /// Keeps every warning logged during tests.
    struct CaptureLog;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static CAPTURE: CaptureLog = CaptureLog;

    impl log::Log for CaptureLog {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                let mut lines = CAPTURED.lock().unwrap_or_else(|e| e.into_inner());
                lines.push(format!("{}", record.args()));
            }
        }

        fn flush(&self) {}
    }

    fn captured_containing(needle: &str) -> usize {
        let lines = CAPTURED.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().filter(|l| l.contains(needle)).count()
    }

    #[test]
    fn out_of_range_target_clamps_logs_and_keeps_running() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Warn);

        let (mut engine, mut sink) = settled_at(1000);
        let before = engine.clamp_events();

        // 5123 is not used by any other test, so the count below is exact
        run(&mut engine, &mut sink, &[5123; CHANNEL_COUNT], 10);

        assert!(engine.channels().iter().all(|c| c.target == 4000));
        assert_eq!(engine.clamp_events(), before + CHANNEL_COUNT as u32);
        assert_eq!(
            captured_containing("target 5123 outside [1000, 4000], clamped to 4000"),
            CHANNEL_COUNT
        );
        assert!(!engine.is_halted());
    }

    #[test]
    fn clamping_is_idempotent_at_both_bounds() {
        let (mut engine, mut sink) = settled_at(2000);

        for _ in 0..5 {
            run(&mut engine, &mut sink, &[i16::MAX; CHANNEL_COUNT], 10);
            assert!(engine.channels().iter().all(|c| c.target == 4000));
        }
        run(&mut engine, &mut sink, &[-300; CHANNEL_COUNT], 10);
        assert!(engine.channels().iter().all(|c| c.target == 1000));
        run(&mut engine, &mut sink, &[-300; CHANNEL_COUNT], 10);
        assert!(engine.channels().iter().all(|c| c.target == 1000 && c.current == 1000));
        assert!(!engine.is_halted());
    }

    #[test]
    fn look_ahead_fires_once_per_cycle_before_the_snap() {
        let mut engine = ServoEngine::new(RAMP);
        let mut sink = RecordingSink::default();
        let targets = [1500; CHANNEL_COUNT];

        let flags: Vec<(u8, bool)> = (0..40)
            .map(|_| {
                let flag = engine.tick(&targets, &mut sink).unwrap();
                (engine.counter(), flag)
            })
            .collect();

        for window in flags.chunks(10) {
            assert_eq!(window.iter().filter(|(_, f)| *f).count(), 1);
        }
        for (counter, flag) in flags {
            assert_eq!(flag, counter == 9);
        }
    }

    #[test]
    fn ramp_is_monotonic_in_both_directions() {
        let (mut engine, mut sink) = settled_at(1000);
        run(&mut engine, &mut sink, &[3333; CHANNEL_COUNT], 10);

        let mut last = engine.channel(0).current;
        for _ in 0..10 {
            engine.tick(&[1111; CHANNEL_COUNT], &mut sink).unwrap();
            let now = engine.channel(0).current;
            assert!(now >= last);
            assert!(now <= 3333);
            last = now;
        }
        assert_eq!(last, 3333);

        for _ in 0..10 {
            engine.tick(&[1111; CHANNEL_COUNT], &mut sink).unwrap();
            let now = engine.channel(0).current;
            assert!(now <= last);
            assert!(now >= 1111);
            last = now;
        }
        assert_eq!(last, 1111);
    }

    #[test]
    fn targets_are_ignored_mid_cycle() {
        let (mut engine, mut sink) = settled_at(1000);
        run(&mut engine, &mut sink, &[3000; CHANNEL_COUNT], 3);
        assert!(engine.channels().iter().all(|c| c.target == 1000));
    }

    #[test]
    fn counter_never_reaches_steps() {
        let mut engine = ServoEngine::new(RAMP);
        let mut sink = RecordingSink::default();
        for _ in 0..55 {
            engine.tick(&[2000; CHANNEL_COUNT], &mut sink).unwrap();
            assert!(engine.counter() < RAMP.steps_per_cycle);
        }
    }

    #[test]
    fn every_tick_emits_a_full_sample() {
        let (_, sink) = settled_at(1200);
        assert_eq!(sink.frames.len(), 20);
        assert!(sink.frames.last().unwrap().iter().all(|&v| v == 1200));
    }

    #[test]
    fn sink_failure_freezes_the_engine() {
        let mut engine = ServoEngine::new(RAMP);
        let mut sink = RecordingSink {
            fail_on_frame: Some(3),
            ..Default::default()
        };
        let targets = [2000; CHANNEL_COUNT];

        run(&mut engine, &mut sink, &targets, 3);
        let err = engine.tick(&targets, &mut sink).unwrap_err();
        assert_eq!(
            err,
            CoreError::Sink(SinkError {
                chip: Chip::A,
                channel: 0
            })
        );
        assert!(engine.is_halted());

        let counter = engine.counter();
        sink.fail_on_frame = None;
        assert_eq!(engine.tick(&targets, &mut sink), Err(CoreError::Halted));
        assert_eq!(engine.counter(), counter);
        assert_eq!(sink.frames.len(), 3);
    }
}
