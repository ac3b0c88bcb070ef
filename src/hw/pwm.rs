// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PWM outputs via direct PAC register access.
//!
//! - [`MotorPwm`] drives the H-bridge: TIM4 CH1 at [`MOTOR_PWM_HZ`] on PD12 plus a direction GPIO.
//! - [`ServoPwm`] drives the hobby servo: TIM12 CH1 at [`SERVO_FRAME_HZ`] on PB14.
//!
//! Every compare write is read back; a register that does not hold the written value is reported
//! as a hardware error so the scheduler can fault.

use stm32f7xx_hal::{
    gpio::{gpiod, Output, PushPull},
    pac,
};

use crate::config::{MOTOR_PWM_HZ, SERVO_FRAME_HZ, TIMER_CLOCK_HZ};
use crate::drivers::{Direction, MotorOutput, PulseOutput};
use crate::error::HwError;

/// OCxM = PWM mode 1, OCxPE = preload enable, for channel 1 in CCMR1.
const CCMR1_OC1_PWM1_PRELOAD: u32 = (0b110 << 4) | (1 << 3);

/// Prescaler and auto-reload giving `hz` from the timer clock with the finest resolution that
/// fits in 16 bits.
const fn timebase(hz: u32) -> (u16, u16) {
    let ticks = TIMER_CLOCK_HZ / hz;
    let psc = ticks / 0x1_0000;
    let arr = ticks / (psc + 1) - 1;
    (psc as u16, arr as u16)
}

pub type DirPin = gpiod::PD13<Output<PushPull>>;

/// Drive motor PWM (TIM4 CH1) and direction line.
pub struct MotorPwm {
    tim: pac::TIM4,
    dir: DirPin,
    max_duty: u16,
}

impl MotorPwm {
    pub fn tim4(tim: pac::TIM4, mut dir: DirPin) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim4en().set_bit());

        let (psc, arr) = timebase(MOTOR_PWM_HZ);
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(u32::from(psc)) });
        tim.arr.write(|w| unsafe { w.bits(u32::from(arr)) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });
        tim.ccmr1_output()
            .modify(|r, w| unsafe { w.bits((r.bits() & !0xFF) | CCMR1_OC1_PWM1_PRELOAD) });
        tim.ccer.modify(|_, w| w.cc1p().clear_bit().cc1e().set_bit());

        // Load the preloaded registers, then start with the output idle
        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());

        dir.set_low();

        Self {
            tim,
            dir,
            max_duty: arr.saturating_add(1),
        }
    }
}

impl MotorOutput for MotorPwm {
    #[inline]
    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_duty(&mut self, compare: u16) -> Result<(), HwError> {
        let compare = u32::from(compare.min(self.max_duty));
        self.tim.ccr1.write(|w| unsafe { w.bits(compare) });
        if self.tim.ccr1.read().bits() != compare {
            return Err(HwError::PwmWrite);
        }
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), HwError> {
        let high = direction == Direction::Reverse;
        if high {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        if self.dir.is_set_high() != high {
            return Err(HwError::Direction);
        }
        Ok(())
    }
}

/// Servo pulse output (TIM12 CH1).
pub struct ServoPwm {
    tim: pac::TIM12,
    max_duty: u16,
}

impl ServoPwm {
    pub fn tim12(tim: pac::TIM12) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim12en().set_bit());

        let (psc, arr) = timebase(SERVO_FRAME_HZ);
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(u32::from(psc)) });
        tim.arr.write(|w| unsafe { w.bits(u32::from(arr)) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });
        tim.ccmr1_output()
            .modify(|r, w| unsafe { w.bits((r.bits() & !0xFF) | CCMR1_OC1_PWM1_PRELOAD) });
        tim.ccer.modify(|_, w| w.cc1p().clear_bit().cc1e().set_bit());

        tim.egr.write(|w| w.ug().set_bit());
        tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());

        Self {
            tim,
            max_duty: arr.saturating_add(1),
        }
    }
}

impl PulseOutput for ServoPwm {
    #[inline]
    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_pulse(&mut self, compare: u16) -> Result<(), HwError> {
        let compare = u32::from(compare.min(self.max_duty));
        self.tim.ccr1.write(|w| unsafe { w.bits(compare) });
        if self.tim.ccr1.read().bits() != compare {
            return Err(HwError::ServoWrite);
        }
        Ok(())
    }
}
