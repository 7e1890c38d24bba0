// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 on the RocBot controller board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpioc, gpiod, gpioe, Alternate, Analog, Output, PushPull},
    pac,
    prelude::*,
};

use crate::hw::i2c::{Scl, Sda};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
    pub usart2: Usart2Pins,
    pub i2c1: I2c1Pins,
    pub wheel: WheelPins,
    pub beeper: gpioe::PE4<Output<PushPull>>,
    /// Battery divider tap, ADC1_IN14
    pub vbat: gpioc::PC4<Analog>,
}

pub struct LedPins {
    pub red: gpiod::PD8<Output<PushPull>>,
    pub yellow: gpiod::PD9<Output<PushPull>>,
    pub green: gpiod::PD10<Output<PushPull>>,
}

/// Debug terminal
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// Bluetooth command channel
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// PCA9685 expander bus
pub struct I2c1Pins {
    pub scl: Scl,
    pub sda: Sda,
}

/// Wheel H-bridge and steering servo
pub struct WheelPins {
    pub in1: gpiod::PD14<Output<PushPull>>,
    pub in2: gpiod::PD15<Output<PushPull>>,
    pub steer: gpiod::PD12<Alternate<2>>, // TIM4_CH1 (PWM)
}

/// ADC1 channel wired to [`BoardPins::vbat`].
pub const VBAT_ADC_CHANNEL: u8 = 14;

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(
        gpioa: pac::GPIOA,
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
    ) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();

        Self {
            leds: LedPins {
                red: gpiod.pd8.into_push_pull_output(),
                yellow: gpiod.pd9.into_push_pull_output(),
                green: gpiod.pd10.into_push_pull_output(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            usart2: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            i2c1: I2c1Pins {
                scl: gpiob.pb8.into_alternate_open_drain::<4>(),
                sda: gpiob.pb9.into_alternate_open_drain::<4>(),
            },

            wheel: WheelPins {
                in1: gpiod.pd14.into_push_pull_output(),
                in2: gpiod.pd15.into_push_pull_output(),
                steer: gpiod.pd12.into_alternate::<2>(),
            },

            beeper: gpioe.pe4.into_push_pull_output(),

            vbat: gpioc.pc4.into_analog(),
        }
    }
}
