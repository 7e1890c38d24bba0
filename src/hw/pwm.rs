// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Steering servo PWM on TIM4 channel 1 (PD12), configured through the PAC.
//!
//! The counter ticks at 1 MHz with a 20 ms frame, so one duty count is one microsecond of pulse.

use embedded_hal::PwmPin;
use stm32f7xx_hal::pac;

use crate::config::STEERING_FRAME_US;

const COUNTER_HZ: u32 = 1_000_000;

pub struct SteeringPwm {
    tim: pac::TIM4,
}

impl SteeringPwm {
    /// Configure TIM4 CH1 for 50 Hz PWM mode 1. Output is left disabled.
    pub fn tim4(tim: pac::TIM4, timer_clk_hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        let psc = (timer_clk_hz / COUNTER_HZ).saturating_sub(1);
        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(STEERING_FRAME_US - 1) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });

        // CH1 output, PWM mode 1, preload on
        tim.ccmr1_output()
            .modify(|_, w| unsafe { w.cc1s().bits(0b00).oc1m().bits(0b110).oc1pe().set_bit() });
        tim.cr1.modify(|_, w| w.arpe().set_bit());

        // Latch the registers and start counting
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    pub fn free(self) -> pac::TIM4 {
        self.tim
    }
}

impl PwmPin for SteeringPwm {
    type Duty = u16;

    fn disable(&mut self) {
        self.tim.ccer.modify(|_, w| w.cc1e().clear_bit());
    }

    fn enable(&mut self) {
        self.tim.ccer.modify(|_, w| w.cc1e().set_bit());
    }

    fn get_duty(&self) -> u16 {
        self.tim.ccr1.read().bits() as u16
    }

    fn get_max_duty(&self) -> u16 {
        STEERING_FRAME_US as u16
    }

    fn set_duty(&mut self, duty: u16) {
        self.tim.ccr1.write(|w| unsafe { w.bits(duty as u32) });
    }
}
