// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board bring-up, the two tick interrupts and the background loop.
//!
//! Interrupt layout:
//! - TIM6: motion tick, period set by the nominal speed
//! - TIM7: battery tick, every `BATTERY_TICK_MS`, also drives the millisecond clock
//!
//! Both handlers run at the same NVIC priority and do their work inside a critical section, so
//! neither ever preempts the other.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use cortex_m::interrupt::{self as irq, Mutex};
use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    gpio::{gpiod, Output, PushPull},
    i2c::{BlockingI2c, Mode},
    pac::{self, interrupt, Interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use rocbot::config::{
    RampConfig, BATTERY_TICK_MS, DEFAULT_SPEED_MS, MOTION_TIMER_BASE_HZ, PCA9685_PRESCALE,
    STEPS_PER_CYCLE,
};
use rocbot::control::locomotion::motion_timer_reload;
use rocbot::control::{BatteryLevel, LocomotionSnapshot, MotionScheduler, PhaseGait};
use rocbot::drivers::{DualPca9685, GpioBeeper, HBridgeWheel};
use rocbot::error::CoreError;
use rocbot::hw::i2c;
use rocbot::hw::pins::VBAT_ADC_CHANNEL;
use rocbot::hw::{
    BatterySense, BoardPins, CommandPort, SharedI2c, StatusLed, SteeringPwm, TickTimer, Usart,
    UsartLogger,
};
use rocbot::monitor::{BackgroundMonitor, NoGasSensor};
use rocbot::protocol::CommandMailbox;

type Sink = DualPca9685<SharedI2c>;
type Wheel = HBridgeWheel<
    gpiod::PD14<Output<PushPull>>,
    gpiod::PD15<Output<PushPull>>,
    SteeringPwm,
>;
type Beat = StatusLed<gpiod::PD10<Output<PushPull>>>;
type Beeper = GpioBeeper<hal::gpio::gpioe::PE4<Output<PushPull>>>;

struct MotionTask {
    scheduler: MotionScheduler<Sink, PhaseGait, Wheel, Beat>,
    timer: TickTimer<pac::TIM6>,
}

struct BatteryTask {
    adc: BatterySense,
    timer: TickTimer<pac::TIM7>,
}

/// Battery timer counts at 1 kHz so the reload is in milliseconds.
const BATTERY_TIMER_BASE_HZ: u32 = 1_000;

const BT_BAUD: u32 = 9_600;
const DEBUG_BAUD: u32 = 115_200;

static MAILBOX: CommandMailbox = CommandMailbox::new();
static BATTERY: BatteryLevel = BatteryLevel::new();
static SNAPSHOT: LocomotionSnapshot = LocomotionSnapshot::new();
static MILLIS: AtomicU32 = AtomicU32::new(0);
static MOTION_STOPPED: AtomicBool = AtomicBool::new(false);

static MOTION: Mutex<RefCell<Option<MotionTask>>> = Mutex::new(RefCell::new(None));
static BATTERY_TASK: Mutex<RefCell<Option<BatteryTask>>> = Mutex::new(RefCell::new(None));

/// What the background loop keeps after boot.
struct Background {
    monitor: BackgroundMonitor<NoGasSensor, Beeper>,
    port: CommandPort<pac::USART2>,
}

#[entry]
fn main() -> ! {
    let mut bg = match boot() {
        Ok(bg) => bg,
        Err(e) => halt(e),
    };

    let mut alerted = false;
    loop {
        let now = MILLIS.load(Ordering::Relaxed);
        if let Err(e) = bg
            .monitor
            .poll(bg.port.drain(), &MAILBOX, &BATTERY, &SNAPSHOT, now)
        {
            log::error!("background loop: {}", e);
        }

        if !alerted && MOTION_STOPPED.load(Ordering::Acquire) {
            stop_run();
            bg.monitor.raise_alert();
            alerted = true;
        }
    }
}

fn boot() -> Result<Background, CoreError> {
    let dp = pac::Peripherals::take().ok_or(CoreError::Init("device peripherals"))?;
    let mut cp = cortex_m::Peripherals::take().ok_or(CoreError::Init("core peripherals"))?;

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
    let mut apb1 = rcc.apb1;
    let timer_clk_hz = clocks.timclk1().raw();

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);

    // USART1 (DBG) first so the rest of boot is visible.
    let debug = Serial::new(
        dp.USART1,
        (pins.usart1.tx, pins.usart1.rx),
        &clocks,
        Config {
            baud_rate: DEBUG_BAUD.bps(),
            ..Default::default()
        },
    );
    UsartLogger::init(Usart::new(debug), log::LevelFilter::Info)?;
    log::info!("rocbot booting");

    // LED
    let mut red = StatusLed::active_low(pins.leds.red);
    let mut yellow = StatusLed::active_low(pins.leds.yellow);
    let heartbeat = StatusLed::active_low(pins.leds.green);
    yellow.set(true);

    // Battery ADC
    let adc = BatterySense::new(dp.ADC1, VBAT_ADC_CHANNEL);
    let _vbat = pins.vbat;

    // Command transport
    let bt = Serial::new(
        dp.USART2,
        (pins.usart2.tx, pins.usart2.rx),
        &clocks,
        Config {
            baud_rate: BT_BAUD.bps(),
            ..Default::default()
        },
    );
    let port = CommandPort::new(bt);

    // PWM expanders
    let i2c1 = BlockingI2c::i2c1(
        dp.I2C1,
        (pins.i2c1.scl, pins.i2c1.sda),
        Mode::fast(400.kHz()),
        &clocks,
        &mut apb1,
        10_000,
    );
    let (bus_a, bus_b) = i2c::share(i2c1)?;
    let sink = match DualPca9685::new(bus_a, bus_b, PCA9685_PRESCALE) {
        Ok(sink) => sink,
        Err(e) => {
            red.set(true);
            return Err(e);
        }
    };

    // Servo timer
    let reload = motion_timer_reload(DEFAULT_SPEED_MS, STEPS_PER_CYCLE);
    let mut motion_timer =
        TickTimer::tim6(dp.TIM6, timer_clk_hz, MOTION_TIMER_BASE_HZ, reload);

    // Wheel motor
    let _steer_pin = pins.wheel.steer;
    let steer = SteeringPwm::tim4(dp.TIM4, timer_clk_hz);
    let wheel = HBridgeWheel::new(pins.wheel.in1, pins.wheel.in2, steer)?;

    // Beeper
    let beeper = GpioBeeper::new(pins.beeper)?;

    // Neutral stance, one primed tick, then the real period.
    let mut scheduler =
        MotionScheduler::new(RampConfig::DEFAULT, sink, PhaseGait::new(), wheel, heartbeat);
    let reload = scheduler.start()?;
    motion_timer.set_reload(reload);
    SNAPSHOT.publish(scheduler.locomotion());

    let mut battery_timer = TickTimer::tim7(
        dp.TIM7,
        timer_clk_hz,
        BATTERY_TIMER_BASE_HZ,
        BATTERY_TICK_MS,
    );

    motion_timer.start();
    battery_timer.start();

    irq::free(|cs| {
        MOTION.borrow(cs).replace(Some(MotionTask {
            scheduler,
            timer: motion_timer,
        }));
        BATTERY_TASK.borrow(cs).replace(Some(BatteryTask {
            adc,
            timer: battery_timer,
        }));
    });

    // Equal priority: the two ticks never nest.
    unsafe {
        cp.NVIC.set_priority(Interrupt::TIM6_DAC, 0x40);
        cp.NVIC.set_priority(Interrupt::TIM7, 0x40);
        NVIC::unmask(Interrupt::TIM6_DAC);
        NVIC::unmask(Interrupt::TIM7);
    }

    yellow.set(false);
    log::info!("boot complete, motion reload {}", reload);

    Ok(Background {
        monitor: BackgroundMonitor::new(NoGasSensor, beeper),
        port,
    })
}

/// Stop the motion timer and the scheduler. Output stays frozen at the last sample.
fn stop_run() {
    irq::free(|cs| {
        if let Some(task) = MOTION.borrow(cs).borrow_mut().as_mut() {
            task.timer.stop();
            if let Err(e) = task.scheduler.stop() {
                log::error!("stop run: {}", e);
            }
        }
    });
    log::error!("motion stopped, reset required");
}

/// Non-progressing halt for boot failures.
fn halt(err: CoreError) -> ! {
    log::error!("boot failed: {}", err);
    loop {
        cortex_m::asm::nop();
    }
}

#[interrupt]
fn TIM6_DAC() {
    irq::free(|cs| {
        let mut slot = MOTION.borrow(cs).borrow_mut();
        let Some(task) = slot.as_mut() else {
            return;
        };
        task.timer.clear_update();

        match task.scheduler.tick(MAILBOX.latest()) {
            Ok(_) => SNAPSHOT.publish(task.scheduler.locomotion()),
            Err(_) => {
                task.timer.stop();
                MOTION_STOPPED.store(true, Ordering::Release);
            }
        }
    });
}

#[interrupt]
fn TIM7() {
    irq::free(|cs| {
        if let Some(task) = BATTERY_TASK.borrow(cs).borrow_mut().as_mut() {
            task.timer.clear_update();
            BATTERY.record_raw(task.adc.sample());
        }
    });
    MILLIS.fetch_add(BATTERY_TICK_MS as u32, Ordering::Relaxed);
}
