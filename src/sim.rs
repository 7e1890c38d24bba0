// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host simulation of the motion core.
//!
//! The two periodic tasks (motion tick and battery tick) are serviced by one timer thread, so
//! they never preempt each other. Scheduler state sits behind a single mutex shared with the
//! background loop, which runs on the main thread and feeds scripted command frames through the
//! same parser the firmware uses.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser as CliParser};
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;
use log::LevelFilter;
use thiserror::Error;

use rocbot::config::{
    RampConfig, ADC_FULL_SCALE, ADC_REFERENCE_MV, BATTERY_DIVIDER_DEN, BATTERY_DIVIDER_NUM,
    BATTERY_TICK_MS, CHANNEL_COUNT, DEFAULT_SPEED_MS, MOTION_TIMER_BASE_HZ, STEERING_FRAME_US,
    STEPS_PER_CYCLE,
};
use rocbot::control::{BatteryLevel, Heartbeat, LocomotionSnapshot, MotionScheduler, PhaseGait};
use rocbot::drivers::{Alarm, Chip, GpioBeeper, HBridgeWheel, PwmSink};
use rocbot::error::{CoreError, SinkError};
use rocbot::monitor::{BackgroundMonitor, NoGasSensor};
use rocbot::protocol::{Command, CommandMailbox, Parser};

#[derive(CliParser, Debug)]
#[command(
    name = "rocbot",
    version,
    about = "Run the RocBot motion core against simulated hardware"
)]
struct Args {
    /// Command codes to send in order, hex or decimal (e.g. `0x02,0x04,0x01`)
    #[arg(short, long, value_delimiter = ',', value_parser = parse_code, default_value = "0x02")]
    commands: Vec<u8>,

    /// Ramp cycles to hold each command before sending the next
    #[arg(long, default_value_t = 4)]
    cycles: u32,

    /// Duration of one ramp cycle in milliseconds
    #[arg(long, default_value_t = DEFAULT_SPEED_MS)]
    speed_ms: u16,

    /// Simulated battery pack voltage in millivolts
    #[arg(long, default_value_t = 7400)]
    battery_mv: u16,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_code(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("bad command code `{}`: {}", s, e))
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("an error occured while setting up the logger: {0}")]
    Logger(log::SetLoggerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("timer thread panicked")]
    TimerThread,
}

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

/// Logs each PCA9685 write at trace and keeps the last off-time per channel.
struct RecordingSink {
    off: [u16; CHANNEL_COUNT],
    writes: u64,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            off: [0; CHANNEL_COUNT],
            writes: 0,
        }
    }
}

impl PwmSink for RecordingSink {
    fn write_channel(&mut self, channel: usize, _on: u16, off: u16) -> Result<(), SinkError> {
        let Some(slot) = self.off.get_mut(channel) else {
            let (chip, channel) = Chip::locate(channel);
            return Err(SinkError { chip, channel });
        };
        *slot = off;
        self.writes += 1;
        log::trace!("pwm[{}] = {}", channel, off);
        Ok(())
    }
}

struct SimPin {
    name: &'static str,
    high: bool,
}

impl SimPin {
    fn new(name: &'static str) -> Self {
        Self { name, high: false }
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        if self.high {
            log::trace!("{} low", self.name);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.high {
            log::trace!("{} high", self.name);
        }
        self.high = true;
        Ok(())
    }
}

/// Steering servo with microsecond duty resolution.
#[derive(Default)]
struct SimServo {
    duty: u16,
    enabled: bool,
}

impl PwmPin for SimServo {
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
        STEERING_FRAME_US as u16
    }

    fn set_duty(&mut self, duty: u16) {
        if self.enabled && duty != self.duty {
            log::debug!("steering pulse {} us", duty);
        }
        self.duty = duty;
    }
}

#[derive(Default)]
struct SimLed {
    on: bool,
}

impl Heartbeat for SimLed {
    fn toggle(&mut self) {
        self.on = !self.on;
        log::trace!("heartbeat {}", if self.on { "on" } else { "off" });
    }
}

type SimScheduler =
    MotionScheduler<RecordingSink, PhaseGait, HBridgeWheel<SimPin, SimPin, SimServo>, SimLed>;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Cross-context state. Everything else is owned by the scheduler behind the mutex.
struct Shared {
    mailbox: CommandMailbox,
    battery: BatteryLevel,
    snapshot: LocomotionSnapshot,
    millis: AtomicU32,
    running: AtomicBool,
    motion_stopped: AtomicBool,
}

fn lock(core: &Mutex<SimScheduler>) -> MutexGuard<'_, SimScheduler> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Inverse of the battery divider and ADC conversion.
fn millivolts_to_raw(mv: u16) -> u16 {
    let raw = mv as u32 * BATTERY_DIVIDER_DEN * ADC_FULL_SCALE
        / (BATTERY_DIVIDER_NUM * ADC_REFERENCE_MV);
    raw.min(ADC_FULL_SCALE) as u16
}

/// Timer thread: services both periodic tasks from one virtual clock counted in motion timer
/// counts (100 us).
fn run_timers(core: Arc<Mutex<SimScheduler>>, shared: Arc<Shared>, battery_raw: u16) {
    let count_us = 1_000_000 / MOTION_TIMER_BASE_HZ as u64;
    let battery_period = BATTERY_TICK_MS as u64 * 1000 / count_us;

    let start = Instant::now();
    let mut next_motion = lock(&core).timer_reload() as u64;
    let mut next_battery = battery_period;
    let mut motion_enabled = true;

    while shared.running.load(Ordering::Acquire) {
        let now = if motion_enabled {
            next_motion.min(next_battery)
        } else {
            next_battery
        };
        let deadline = start + Duration::from_micros(now * count_us);
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }

        let mut scheduler = lock(&core);

        if motion_enabled && now >= next_motion {
            match scheduler.tick(shared.mailbox.latest()) {
                Ok(report) => {
                    shared.snapshot.publish(scheduler.locomotion());
                    if report.refreshed {
                        log::debug!("tick {}: new targets", scheduler.ticks());
                    }
                    next_motion += scheduler.timer_reload() as u64;
                }
                Err(_) => {
                    // motion timer stopped
                    motion_enabled = false;
                    shared.motion_stopped.store(true, Ordering::Release);
                }
            }
        }

        if now >= next_battery {
            shared.battery.record_raw(battery_raw);
            shared
                .millis
                .fetch_add(BATTERY_TICK_MS as u32, Ordering::Relaxed);
            next_battery += battery_period;
        }
    }
}

fn init_logger(level: LevelFilter) -> Result<(), SimError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .map_err(SimError::Logger)
}

pub fn run() -> Result<(), SimError> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    init_logger(level)?;

    let wheel = HBridgeWheel::new(SimPin::new("in1"), SimPin::new("in2"), SimServo::default())
        .map_err(CoreError::from)?;
    let mut scheduler = MotionScheduler::new(
        RampConfig::DEFAULT,
        RecordingSink::new(),
        PhaseGait::new(),
        wheel,
        SimLed::default(),
    );
    scheduler.set_nominal_speed(args.speed_ms);
    let reload = scheduler.start()?;
    log::info!(
        "simulation running, motion reload {} ({} ms per ramp cycle)",
        reload,
        scheduler.locomotion().nominal_speed_ms()
    );

    let shared = Arc::new(Shared {
        mailbox: CommandMailbox::new(),
        battery: BatteryLevel::new(),
        snapshot: LocomotionSnapshot::new(),
        millis: AtomicU32::new(0),
        running: AtomicBool::new(true),
        motion_stopped: AtomicBool::new(false),
    });
    shared.snapshot.publish(scheduler.locomotion());

    let core = Arc::new(Mutex::new(scheduler));
    let timer = {
        let core = Arc::clone(&core);
        let shared = Arc::clone(&shared);
        let raw = millivolts_to_raw(args.battery_mv);
        thread::spawn(move || run_timers(core, shared, raw))
    };

    let beeper = GpioBeeper::new(SimPin::new("beeper")).map_err(CoreError::from)?;
    let mut monitor = BackgroundMonitor::new(NoGasSensor, beeper);

    let ticks_per_command = args.cycles.max(1) * STEPS_PER_CYCLE as u32;
    let mut script = args.commands.iter();
    let mut rx: Vec<u8> = Vec::new();
    let mut next_switch = 0;
    let mut alert_raised = false;

    // Background loop
    loop {
        let ticks = lock(&core).ticks();
        if ticks >= next_switch {
            match script.next() {
                Some(&code) => {
                    log::info!("sending {:#04x} ({:?})", code, Command::from_code(code));
                    rx.extend_from_slice(&Parser::frame(code));
                    next_switch = ticks + ticks_per_command;
                }
                None => break,
            }
        }

        let now = shared.millis.load(Ordering::Relaxed);
        monitor
            .poll(
                rx.drain(..),
                &shared.mailbox,
                &shared.battery,
                &shared.snapshot,
                now,
            )
            .map_err(CoreError::from)?;

        if !alert_raised && shared.motion_stopped.load(Ordering::Acquire) {
            monitor.raise_alert();
            alert_raised = true;
        }
        // stop path: let the alert play out before shutting down
        if alert_raised && !monitor.alarm().is_sounding() {
            break;
        }

        thread::sleep(Duration::from_millis(1));
    }

    shared.running.store(false, Ordering::Release);
    timer.join().map_err(|_| SimError::TimerThread)?;

    let mut scheduler = lock(&core);
    scheduler.stop()?;

    let engine = scheduler.engine();
    log::info!(
        "{} ticks, {} pwm writes, {} clamp events, final state {:?}",
        scheduler.ticks(),
        scheduler.sink().writes,
        engine.clamp_events(),
        scheduler.state()
    );
    log::info!("last pwm off-times: {:?}", scheduler.sink().off);

    if alert_raised {
        log::warn!("motion halted before the script finished");
    }
    Ok(())
}
