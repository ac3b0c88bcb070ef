// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control tick source: TIM6 update interrupt at a fixed rate.

use stm32f7xx_hal::pac;

use crate::config::TIMER_CLOCK_HZ;

pub struct TickTimer {
    tim: pac::TIM6,
}

impl TickTimer {
    /// Configure TIM6 to raise its update interrupt at `hz`. The counter is left stopped.
    pub fn tim6(tim: pac::TIM6, hz: u32) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim6en().set_bit());

        // 1 MHz count, then divide down to the tick rate
        let psc = TIMER_CLOCK_HZ / 1_000_000 - 1;
        let arr = 1_000_000 / hz.max(1) - 1;

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(arr) });
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());
        tim.dier.modify(|_, w| w.uie().set_bit());

        Self { tim }
    }

    pub fn start(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    /// Acknowledge the update interrupt.
    #[inline]
    pub fn clear_interrupt(&mut self) {
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
    }
}
