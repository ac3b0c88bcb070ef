// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # motorloop Firmware
//!
//! Closed-loop control firmware for a single brushed DC drive motor with a quadrature encoder, a
//! hobby servo channel and a framed serial command link, targeting an STM32F777 MCU.
//!
//! Every control component is hardware-independent and lives in this `no_std` library. The board
//! layer in [`hw`] (feature `firmware`) binds the components to timers, GPIO and USART, and the
//! firmware binary wires them to two interrupt handlers: a periodic control tick and the serial
//! receive handler.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`config`]   | Named, validated configuration for every threshold and gain |
//! | [`units`]    | Fixed-point scalar types used on the control path |
//! | [`error`]    | Hardware, framing and configuration error types |
//! | [`drivers`]  | Device contracts (`QuadratureCounter`, `MotorOutput`, `PulseOutput`) and simulated devices |
//! | [`control`]  | Encoder estimation, PID, setpoint handoff and the control scheduler |
//! | [`motors`]   | Slew-limited PWM motor driver and servo driver |
//! | [`protocol`] | Framed serial commands, telemetry and the command link |
//! | [`hw`]       | STM32F7 peripheral bindings (feature `firmware`) |
//!
//! ## Data flow
//!
//! ```text
//! TIM6 update IRQ ──► EncoderEstimator ──► PidController ──► MotorDriver ──► PWM + DIR
//!                          ▲                    ▲
//!                          │               SetpointCell ◄── CommandLink ◄── USART1 RX IRQ
//!                     StateSnapshot ──────────────────────► TelemetryFrame ──► USART1 TX
//! ```
//!
//! ## Getting Started
//!
//! Run the host test-suite:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features firmware --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod motors;
pub mod protocol;
pub mod units;

#[cfg(feature = "firmware")]
pub mod hw;

pub use config::ControlConfig;
pub use control::{ControlScheduler, SchedulerState, SharedState};
pub use error::{ConfigError, FrameError, HwError};
pub use protocol::CommandLink;
