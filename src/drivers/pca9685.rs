// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Two chained PCA9685 16-channel PWM expanders presented as one 32-channel [`PwmSink`].
//!
//! Register access is delegated to the `pwm-pca9685` crate. Each chip owns an I2C handle; on the
//! board both handles are proxies onto the same bus (see `hw::i2c`).

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Address, Channel, Pca9685};

use crate::config::{CHIP_A_ADDRESS, CHIP_B_ADDRESS};
use crate::drivers::pwm_sink::{Chip, PwmSink};
use crate::error::{CoreError, SinkError};

const CHANNELS: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

/// Chip A drives channels 0..16, chip B 16..32.
pub struct DualPca9685<I2C> {
    chip_a: Pca9685<I2C>,
    chip_b: Pca9685<I2C>,
}

impl<I2C, E> DualPca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Bring up both chips at the default addresses with the given prescaler and enable outputs.
    pub fn new(bus_a: I2C, bus_b: I2C, prescale: u8) -> Result<Self, CoreError> {
        Self::with_addresses(bus_a, CHIP_A_ADDRESS, bus_b, CHIP_B_ADDRESS, prescale)
    }

    pub fn with_addresses(
        bus_a: I2C,
        addr_a: u8,
        bus_b: I2C,
        addr_b: u8,
        prescale: u8,
    ) -> Result<Self, CoreError> {
        let chip_a = Self::init_chip(bus_a, addr_a, prescale)
            .map_err(|_| CoreError::Init("pca9685 chip A"))?;
        let chip_b = Self::init_chip(bus_b, addr_b, prescale)
            .map_err(|_| CoreError::Init("pca9685 chip B"))?;

        log::info!("PWM expanders ready at {:#04x}/{:#04x}", addr_a, addr_b);

        Ok(Self { chip_a, chip_b })
    }

    fn init_chip(bus: I2C, address: u8, prescale: u8) -> Result<Pca9685<I2C>, pwm_pca9685::Error<E>> {
        let mut chip = Pca9685::new(bus, Address::from(address))?;
        chip.set_prescale(prescale)?;
        chip.enable()?;
        Ok(chip)
    }

    /// Release both I2C handles.
    pub fn free(self) -> (I2C, I2C) {
        (self.chip_a.destroy(), self.chip_b.destroy())
    }
}

impl<I2C, E> PwmSink for DualPca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn write_channel(&mut self, channel: usize, on: u16, off: u16) -> Result<(), SinkError> {
        let (chip, local) = Chip::locate(channel);
        let err = SinkError {
            chip,
            channel: local,
        };
        let target = CHANNELS.get(local as usize).ok_or(err)?;

        let pca = match chip {
            Chip::A => &mut self.chip_a,
            Chip::B => &mut self.chip_b,
        };
        pca.set_channel_on_off(*target, on, off).map_err(|_| err)
    }
}
