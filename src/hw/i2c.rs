// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared I2C1 bus.
//!
//! Both PCA9685 expanders sit on I2C1. The bus is handed to a `shared-bus` manager guarded by a
//! cortex-m critical section, and each chip driver owns one proxy onto it.

use shared_bus::{BusManagerCortexM, CortexMMutex, I2cProxy};
use stm32f7xx_hal::{
    gpio::{gpiob, Alternate, OpenDrain},
    i2c::BlockingI2c,
    pac::I2C1,
};

use crate::error::CoreError;

pub type Scl = gpiob::PB8<Alternate<4, OpenDrain>>;
pub type Sda = gpiob::PB9<Alternate<4, OpenDrain>>;
pub type Bus = BlockingI2c<I2C1, Scl, Sda>;

/// Proxy handed to each chip driver.
pub type SharedI2c = I2cProxy<'static, CortexMMutex<Bus>>;

/// Move the bus into a static manager and return one proxy per expander.
///
/// Can only succeed once.
pub fn share(bus: Bus) -> Result<(SharedI2c, SharedI2c), CoreError> {
    let manager: &'static BusManagerCortexM<Bus> =
        shared_bus::new_cortexm!(Bus = bus).ok_or(CoreError::Init("i2c1 already shared"))?;
    Ok((manager.acquire_i2c(), manager.acquire_i2c()))
}
