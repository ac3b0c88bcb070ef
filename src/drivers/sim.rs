// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Simulated devices for host-side runs and tests.
//!
//! Each device records the last value written and can be told to fail its next write, which is
//! how the Faulted paths are exercised without hardware.

use super::{Direction, MotorOutput, PulseOutput, QuadratureCounter};
use crate::error::HwError;

/// Quadrature counter of `BITS` width whose count is moved by hand.
#[derive(Clone, Debug, Default)]
pub struct SimEncoder<const BITS: u32> {
    raw: u32,
}

impl<const BITS: u32> SimEncoder<BITS> {
    const MASK: u32 = if BITS >= 32 { u32::MAX } else { (1 << BITS) - 1 };

    pub fn new(raw: u32) -> Self {
        Self {
            raw: raw & Self::MASK,
        }
    }

    /// Move the shaft by `counts`, wrapping like the hardware register.
    pub fn advance(&mut self, counts: i32) {
        self.raw = self.raw.wrapping_add(counts as u32) & Self::MASK;
    }

    /// Force the register to an arbitrary value (simulates a miscount).
    pub fn set_raw(&mut self, raw: u32) {
        self.raw = raw & Self::MASK;
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }
}

impl<const BITS: u32> QuadratureCounter for SimEncoder<BITS> {
    const BITS: u32 = BITS;

    fn read(&mut self) -> u32 {
        self.raw
    }
}

/// PWM + direction stage that records its outputs.
#[derive(Clone, Debug)]
pub struct SimMotor {
    max_duty: u16,
    compare: u16,
    direction: Direction,
    writes: u32,
    fail_next: Option<HwError>,
}

impl SimMotor {
    pub fn new(max_duty: u16) -> Self {
        Self {
            max_duty,
            compare: 0,
            direction: Direction::Neutral,
            writes: 0,
            fail_next: None,
        }
    }

    pub fn compare(&self) -> u16 {
        self.compare
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of successful compare writes.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Make the next compare write fail with `err`.
    pub fn fail_next_write(&mut self, err: HwError) {
        self.fail_next = Some(err);
    }
}

impl MotorOutput for SimMotor {
    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_duty(&mut self, compare: u16) -> Result<(), HwError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.compare = compare.min(self.max_duty);
        self.writes += 1;
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), HwError> {
        self.direction = direction;
        Ok(())
    }
}

/// Servo channel that records its pulse compare value.
#[derive(Clone, Debug)]
pub struct SimServo {
    max_duty: u16,
    compare: u16,
    fail_next: bool,
}

impl SimServo {
    pub fn new(max_duty: u16) -> Self {
        Self {
            max_duty,
            compare: 0,
            fail_next: false,
        }
    }

    pub fn compare(&self) -> u16 {
        self.compare
    }

    pub fn fail_next_write(&mut self) {
        self.fail_next = true;
    }
}

impl PulseOutput for SimServo {
    fn max_duty(&self) -> u16 {
        self.max_duty
    }

    fn set_pulse(&mut self, compare: u16) -> Result<(), HwError> {
        if core::mem::take(&mut self.fail_next) {
            return Err(HwError::ServoWrite);
        }
        self.compare = compare.min(self.max_duty);
        Ok(())
    }
}
