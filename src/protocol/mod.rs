// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Supervisor Protocol
//!
//! Framed binary protocol between the controller and its supervisor over the command UART.
//!
//! - [`messages`] - Frame envelope, checksum and command encoding.
//! - [`parser`] - Byte-at-a-time receive state machine.
//! - [`telemetry`] - Telemetry report layout.
//! - [`link`] - Dispatch of received commands into the shared control state.

pub mod link;
pub mod messages;
pub mod parser;
pub mod telemetry;

pub use link::{CommandLink, FrameSink};
pub use messages::{Command, Frame};
pub use parser::{Parser, RawFrame};
pub use telemetry::TelemetryFrame;
