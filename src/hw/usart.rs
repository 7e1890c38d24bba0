// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! Two ports are used:
//! - USART1 is the debug terminal and the `log` backend ([`UsartLogger`]).
//! - USART2 is the command channel from the Bluetooth module ([`CommandPort`]).
//!
//! To access the debug terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::fmt::{self, Write as _};

use cortex_m::interrupt::{self, Mutex};
use log::{LevelFilter, Metadata, Record};
use nb::block;

use stm32f7xx_hal::{
    pac::USART1,
    prelude::*,
    serial::{Instance, Pins, Rx, Serial, Tx},
};

use crate::error::CoreError;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// Receive half of the command channel. Reads never block.
pub struct CommandPort<U: Instance> {
    rx: Rx<U>,
    overruns: u32,
}

impl<U: Instance> CommandPort<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (_tx, rx) = serial.split();
        Self { rx, overruns: 0 }
    }

    /// Next received byte, if any. Line errors drop the byte and are counted.
    pub fn read_byte(&mut self) -> Option<u8> {
        match self.rx.read() {
            Ok(b) => Some(b),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                self.overruns = self.overruns.wrapping_add(1);
                None
            }
        }
    }

    /// Everything currently waiting in the receiver.
    pub fn drain(&mut self) -> impl Iterator<Item = u8> + '_ {
        core::iter::from_fn(move || self.read_byte())
    }

    #[inline]
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

static DEBUG_PORT: Mutex<RefCell<Option<Usart<USART1>>>> = Mutex::new(RefCell::new(None));

static LOGGER: UsartLogger = UsartLogger;

/// `log` backend writing `[LEVEL] target: message` lines to the debug USART.
///
/// Writes are blocking and run with interrupts masked, so keep logging out of the hot path
/// except for warnings and errors.
pub struct UsartLogger;

impl UsartLogger {
    /// Install the logger over `port`. Call once at boot.
    pub fn init(port: Usart<USART1>, level: LevelFilter) -> Result<(), CoreError> {
        interrupt::free(|cs| {
            DEBUG_PORT.borrow(cs).replace(Some(port));
        });
        log::set_logger(&LOGGER).map_err(|_| CoreError::Init("logger"))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            if let Some(port) = DEBUG_PORT.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(
                    port,
                    "[{}] {}: {}\r\n",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(port) = DEBUG_PORT.borrow(cs).borrow_mut().as_mut() {
                port.flush();
            }
        });
    }
}
