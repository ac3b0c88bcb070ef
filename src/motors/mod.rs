// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Actuator-level wrappers that sit above the device contracts in `drivers`.
//!
//! ## Modules
//!
//! - [`drive`] - Slew-limited, dead-banded PWM drive for the DC motor.
//! - [`servo`] - Position-to-pulse mapping for the hobby servo channel.

pub mod drive;
pub mod servo;

pub use drive::MotorDriver;
pub use servo::Servo;
