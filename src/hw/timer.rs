// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic tick interrupts on the basic timers TIM6 (motion) and TIM7 (battery).
//!
//! The counter runs from a fixed base frequency set by the prescaler; the period is changed by
//! rewriting the auto-reload register, which is buffered so a change takes effect on the next
//! update event.

use stm32f7xx_hal::pac;

pub struct TickTimer<TIM> {
    tim: TIM,
    reload: u16,
}

macro_rules! tick_timer {
    ($TIM:ident, $ctor:ident, $en:ident) => {
        impl TickTimer<pac::$TIM> {
            /// Configure the timer to count at `base_hz` from a `timer_clk_hz` kernel clock and
            /// raise an update interrupt every `reload` counts. The counter is left stopped.
            pub fn $ctor(tim: pac::$TIM, timer_clk_hz: u32, base_hz: u32, reload: u16) -> Self {
                let rcc = unsafe { &*pac::RCC::ptr() };
                rcc.apb1enr.modify(|_, w| w.$en().set_bit());

                tim.cr1.modify(|_, w| w.cen().clear_bit());

                let psc = (timer_clk_hz / base_hz).saturating_sub(1).min(u16::MAX as u32);
                tim.psc.write(|w| unsafe { w.bits(psc) });

                // Buffered reload, update interrupt only on overflow
                tim.cr1.modify(|_, w| w.arpe().set_bit().urs().set_bit());

                let mut timer = Self { tim, reload: 0 };
                timer.set_reload(reload);

                // Latch prescaler and reload, then drop the flag that sets.
                timer.tim.egr.write(|w| w.ug().set_bit());
                timer.clear_update();
                timer.tim.dier.modify(|_, w| w.uie().set_bit());

                timer
            }

            #[inline]
            pub fn start(&mut self) {
                self.tim.cr1.modify(|_, w| w.cen().set_bit());
            }

            #[inline]
            pub fn stop(&mut self) {
                self.tim.cr1.modify(|_, w| w.cen().clear_bit());
            }

            /// Counts between update interrupts. Values below 1 are raised to 1.
            pub fn set_reload(&mut self, reload: u16) {
                let reload = reload.max(1);
                self.tim.arr.write(|w| unsafe { w.bits(reload as u32 - 1) });
                self.reload = reload;
            }

            #[inline]
            pub fn reload(&self) -> u16 {
                self.reload
            }

            /// Acknowledge the update interrupt. Call first thing in the handler.
            #[inline]
            pub fn clear_update(&mut self) {
                self.tim.sr.modify(|_, w| w.uif().clear_bit());
            }

            pub fn free(self) -> pac::$TIM {
                self.tim
            }
        }
    };
}

tick_timer!(TIM6, tim6, tim6en);
tick_timer!(TIM7, tim7, tim7en);
