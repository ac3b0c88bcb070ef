// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control setpoint written by the command link and read by the control tick.

use crate::error::FrameError;
use crate::units::Fx;

/// Operating mode requested by the supervisor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Zero duty, controller state cleared.
    Disabled = 0,
    /// Hold `target` counts of position.
    PositionHold = 1,
    /// Hold `target` counts per tick of velocity.
    VelocityHold = 2,
    /// Pass `target` straight through as duty.
    OpenLoopDuty = 3,
}

impl Mode {
    pub fn from_wire(byte: u8) -> Result<Self, FrameError> {
        match byte {
            0 => Ok(Mode::Disabled),
            1 => Ok(Mode::PositionHold),
            2 => Ok(Mode::VelocityHold),
            3 => Ok(Mode::OpenLoopDuty),
            other => Err(FrameError::InvalidMode(other)),
        }
    }

    #[inline]
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_closed_loop(self) -> bool {
        matches!(self, Mode::PositionHold | Mode::VelocityHold)
    }
}

/// Mode, target and the tick at which they were received.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlSetpoint {
    pub mode: Mode,
    /// Interpreted per mode: counts, counts per tick or duty.
    pub target: Fx,
    /// Control tick count when the setpoint was received.
    pub updated_at: u32,
}

impl ControlSetpoint {
    pub const DISABLED: Self = Self {
        mode: Mode::Disabled,
        target: Fx::ZERO,
        updated_at: 0,
    };

    pub fn new(mode: Mode, target: Fx, updated_at: u32) -> Self {
        Self {
            mode,
            target,
            updated_at,
        }
    }

    /// Ticks since the setpoint was received. Correct across tick counter wrap.
    #[inline]
    pub fn age(&self, now: u32) -> u32 {
        now.wrapping_sub(self.updated_at)
    }

    /// True once the setpoint is older than `timeout_ticks`.
    #[inline]
    pub fn is_stale(&self, now: u32, timeout_ticks: u32) -> bool {
        self.age(now) > timeout_ticks
    }
}

impl Default for ControlSetpoint {
    fn default() -> Self {
        Self::DISABLED
    }
}
