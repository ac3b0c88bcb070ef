// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder support via STM32F7 timers in encoder mode.
//!
//! The board wires the encoder to TIM3, a 16-bit counter. It counts on every edge of both
//! channels (encoder mode 3) and is only ever read; wraparound is handled by the estimator.

use stm32f7xx_hal::pac;

use crate::drivers::QuadratureCounter;

pub struct Encoder<TIM> {
    tim: TIM,
}

macro_rules! encoder_timer {
    ($ctor:ident, $TIM:ident, $en:ident, $bits:expr, $arr:expr) => {
        impl Encoder<pac::$TIM> {
            /// Configure the timer as a quadrature counter and start it from zero.
            pub fn $ctor(tim: pac::$TIM) -> Self {
                let rcc = unsafe { &*pac::RCC::ptr() };
                rcc.apb1enr.modify(|_, w| w.$en().set_bit());

                // Disable counter while configuring
                tim.cr1.modify(|_, w| w.cen().clear_bit());

                tim.arr.write(|w| unsafe { w.bits($arr) });

                // Slave mode: encoder mode 3 (count on both TI1 and TI2)
                tim.smcr.modify(|_, w| w.sms().bits(0b011));

                // Configure CH1/CH2 as inputs from TI1/TI2
                tim.ccmr1_input().modify(|_, w| w.cc1s().ti1().cc2s().ti2());

                // Polarity and enable for both channels.
                tim.ccer.modify(|_, w| {
                    w.cc1p()
                        .clear_bit()
                        .cc2p()
                        .clear_bit()
                        .cc1e()
                        .set_bit()
                        .cc2e()
                        .set_bit()
                });

                tim.cnt.write(|w| unsafe { w.bits(0) });
                tim.cr1.modify(|_, w| w.cen().set_bit());

                Self { tim }
            }
        }

        impl QuadratureCounter for Encoder<pac::$TIM> {
            const BITS: u32 = $bits;

            #[inline]
            fn read(&mut self) -> u32 {
                self.tim.cnt.read().bits()
            }
        }
    };
}

encoder_timer!(tim3, TIM3, tim3en, 16, 0xFFFF);
