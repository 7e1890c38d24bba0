// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Battery voltage sense on ADC1 using direct PAC register access.
//!
//! One blocking single-channel conversion per call; a conversion takes a few microseconds so it
//! is safe to run from the battery tick interrupt.

use stm32f7xx_hal::pac;

pub struct BatterySense {
    adc: pac::ADC1,
    channel: u8,
}

impl BatterySense {
    /// Enable and configure ADC1 for 12-bit software-triggered reads of `channel`.
    pub fn new(adc: pac::ADC1, channel: u8) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        let common = unsafe { &*pac::ADC_COMMON::ptr() };
        // PCLK2 / 4
        common.ccr.modify(|_, w| w.adcpre().div4());

        // Power off to configure
        adc.cr2.modify(|_, w| w.adon().clear_bit());

        // 12-bit, right-aligned, software trigger
        adc.cr1.modify(|_, w| w.res().bits(0b00));
        adc.cr2.modify(|_, w| {
            w.cont().clear_bit();
            w.align().right();
            w.exten().disabled();
            w
        });

        // Longest sample time: the divider has a high source impedance.
        adc.smpr1.modify(|_, w| unsafe { w.bits(0x07FF_FFFF) });
        adc.smpr2.modify(|_, w| unsafe { w.bits(0x3FFF_FFFF) });

        // Single conversion of `channel`
        adc.sqr1.modify(|_, w| w.l().bits(0));
        adc.sqr3.modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });

        adc.cr2.modify(|_, w| w.adon().set_bit());

        Self { adc, channel }
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Raw 12-bit sample at the divider tap.
    pub fn sample(&mut self) -> u16 {
        self.adc.cr2.modify(|_, w| w.swstart().set_bit());
        while self.adc.sr.read().eoc().bit_is_clear() {}
        self.adc.dr.read().data().bits() as u16
    }

    pub fn free(self) -> pac::ADC1 {
        self.adc
    }
}
