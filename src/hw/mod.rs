// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Board Layer
//!
//! STM32F777 peripherals behind the device contracts in [`crate::drivers`]. Only built with the
//! `firmware` feature.

pub mod encoder;
pub mod led;
pub mod pins;
pub mod pwm;
pub mod tick;
pub mod usart;

pub use encoder::Encoder;
pub use led::Led;
pub use pins::BoardPins;
pub use pwm::{MotorPwm, ServoPwm};
pub use tick::TickTimer;
pub use usart::CommandPort;
