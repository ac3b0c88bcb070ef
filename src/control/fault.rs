// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fault causes and the telemetry fault byte.

use crate::error::HwError;

/// Why the scheduler entered the Faulted state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCause {
    /// The drive motor PWM or direction write failed.
    Actuator(HwError),
    /// The servo pulse write failed.
    Servo(HwError),
    /// Too many implausible encoder steps inside the glitch window.
    GlitchBurst,
}

/// Fault byte reported in telemetry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultFlags {
    raw: u8,
}

impl FaultFlags {
    /// At least one implausible encoder step since the last report.
    pub const ENCODER_GLITCH: Self = Self::from_bits(1 << 0);
    /// The last control tick ran with a stale setpoint.
    pub const SETPOINT_STALE: Self = Self::from_bits(1 << 1);
    /// At least one malformed frame since the last report.
    pub const FRAME_ERROR: Self = Self::from_bits(1 << 2);
    /// The scheduler is Faulted.
    pub const FAULTED: Self = Self::from_bits(1 << 3);
    /// Faulted by an actuator write failure.
    pub const PWM_FAULT: Self = Self::from_bits(1 << 4);
    /// Faulted by an encoder glitch burst.
    pub const GLITCH_BURST: Self = Self::from_bits(1 << 5);
    /// The scheduler has not started.
    pub const IDLE: Self = Self::from_bits(1 << 6);

    pub const fn empty() -> Self {
        Self { raw: 0 }
    }

    pub const fn from_bits(raw: u8) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.raw
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.raw == 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.raw & other.raw == other.raw
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.raw |= other.raw;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.raw &= !other.raw;
    }

    #[inline]
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.raw | other.raw)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self::from_bits(self.raw & other.raw)
    }
}

impl FaultCause {
    /// Flags describing this cause, `FAULTED` included.
    pub fn flags(self) -> FaultFlags {
        match self {
            FaultCause::Actuator(_) | FaultCause::Servo(_) => {
                FaultFlags::FAULTED.union(FaultFlags::PWM_FAULT)
            }
            FaultCause::GlitchBurst => FaultFlags::FAULTED.union(FaultFlags::GLITCH_BURST),
        }
    }
}
