// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device Contracts
//!
//! The control path never touches registers. It reaches the encoder timer, the motor PWM stage
//! and the servo channel only through the traits in this module, implemented by the board layer
//! (`hw`, feature `firmware`) on the MCU and by the simulated devices in [`sim`] on the host.
//!
//! ## Contracts
//!
//! - [`QuadratureCounter`] – free-running hardware quadrature counter of fixed bit width
//! - [`MotorOutput`] – PWM compare register plus a direction line
//! - [`PulseOutput`] – fixed-frame pulse output for a hobby servo

pub mod sim;

use crate::error::HwError;

/// Direction line state of the H-bridge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
    /// No drive: compare held at zero, bridge coasting.
    Neutral,
}

/// Read-only view of a hardware quadrature counter.
pub trait QuadratureCounter {
    /// Width of the counter register; the count wraps modulo `2^BITS`.
    const BITS: u32;

    /// Current raw count. Bits above [`Self::BITS`] are ignored by the caller.
    fn read(&mut self) -> u32;
}

/// PWM compare register and direction GPIO of the drive motor.
pub trait MotorOutput {
    /// Compare value for a 100% pulse.
    fn max_duty(&self) -> u16;

    /// Write the compare register.
    fn set_duty(&mut self, compare: u16) -> Result<(), HwError>;

    /// Drive the direction line.
    fn set_direction(&mut self, direction: Direction) -> Result<(), HwError>;
}

/// Fixed-frame pulse output (servo channel).
pub trait PulseOutput {
    /// Compare value for a pulse spanning the whole frame.
    fn max_duty(&self) -> u16;

    /// Write the compare register. Zero disables the pulse.
    fn set_pulse(&mut self, compare: u16) -> Result<(), HwError>;
}
