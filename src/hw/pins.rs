// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 motor controller board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpiod, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
    pub encoder: EncoderPins,
    pub motor: MotorPins,
    pub servo: ServoPins,
}

pub struct LedPins {
    /// Lit while the scheduler is Faulted.
    pub red: gpiod::PD8<Output<PushPull>>,
    /// Lit while the scheduler is Running.
    pub green: gpiod::PD10<Output<PushPull>>,
}

/// Command link.
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// TIM3 quadrature encoder inputs
pub struct EncoderPins {
    pub tim3_ch1: gpioa::PA6<Alternate<2>>,
    pub tim3_ch2: gpioa::PA7<Alternate<2>>,
}

/// H-bridge control pins
pub struct MotorPins {
    pub pwm: gpiod::PD12<Alternate<2>>, // TIM4_CH1
    pub dir: gpiod::PD13<Output<PushPull>>,
}

pub struct ServoPins {
    pub pwm: gpiob::PB14<Alternate<9>>, // TIM12_CH1
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpiod = gpiod.split();

        Self {
            leds: LedPins {
                red: gpiod.pd8.into_push_pull_output(),
                green: gpiod.pd10.into_push_pull_output(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            encoder: EncoderPins {
                tim3_ch1: gpioa.pa6.into_alternate::<2>(),
                tim3_ch2: gpioa.pa7.into_alternate::<2>(),
            },

            motor: MotorPins {
                pwm: gpiod.pd12.into_alternate::<2>(),
                dir: gpiod.pd13.into_push_pull_output(),
            },

            servo: ServoPins {
                pwm: gpiob.pb14.into_alternate::<9>(),
            },
        }
    }
}
