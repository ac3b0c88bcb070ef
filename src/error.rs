// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error types.
//!
//! None of these ever unwind an interrupt handler: [`HwError`] drives the scheduler into its
//! Faulted state, [`FrameError`] is counted and the frame dropped, and [`ConfigError`] is
//! reported once at startup before the control tick is enabled.

use thiserror::Error;

/// Failure writing an actuator peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwError {
    /// The PWM compare register did not accept the written value.
    #[error("PWM compare write failed")]
    PwmWrite,
    /// The direction output could not be driven.
    #[error("direction output write failed")]
    Direction,
    /// The servo pulse register did not accept the written value.
    #[error("servo pulse write failed")]
    ServoWrite,
}

/// Reason a received frame was discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    #[error("checksum mismatch: computed {expected:#04x}, received {found:#04x}")]
    Checksum { expected: u8, found: u8 },
    #[error("unknown message id {0:#04x}")]
    UnknownCommand(u8),
    #[error("message {id:#04x} declares {found} payload bytes, expected {expected}")]
    LengthMismatch { id: u8, expected: u8, found: u8 },
    #[error("unknown control mode {0}")]
    InvalidMode(u8),
}

/// Inconsistent configuration, rejected before the scheduler is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("control tick rate must be non-zero")]
    ZeroTickRate,
    #[error("encoder plausibility step must be in 1..=32767 counts")]
    PlausibleStep,
    #[error("velocity smoothing coefficient must be in (0, 1]")]
    Smoothing,
    #[error("slew limit must be in (0, 2]")]
    SlewLimit,
    #[error("dead-band must be in [0, 1)")]
    DeadBand,
    #[error("pulse range must satisfy 0 <= min <= max <= 1")]
    PulseRange,
    #[error("servo pulse range must satisfy min < max < frame")]
    ServoRange,
    #[error("glitch burst must be in 1..=window and window in 1..=64")]
    GlitchWindow,
    #[error("staleness timeout must be non-zero")]
    ZeroStaleTimeout,
    #[error("telemetry interval must be non-zero")]
    ZeroTelemetryInterval,
}
