// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! The closed-loop motor control path, run once per control tick.
//!
//! ## Modules
//!
//! - [`estimator`] - Quadrature position and filtered velocity with glitch rejection.
//! - [`pid`] - Fixed-point PID with conditional integration.
//! - [`setpoint`] - Control modes and the supervisor's setpoint.
//! - [`shared`] - Versioned setpoint handoff and state snapshot shared with the serial handler.
//! - [`fault`] - Fault causes and telemetry fault flags.
//! - [`scheduler`] - Idle/Running/Faulted state machine driving one tick.

pub mod estimator;
pub mod fault;
pub mod pid;
pub mod scheduler;
pub mod setpoint;
pub mod shared;

pub use estimator::{EncoderEstimator, EncoderState};
pub use fault::{FaultCause, FaultFlags};
pub use pid::{ActuatorCommand, ControllerState, PidController};
pub use scheduler::{ControlScheduler, SchedulerState, TickReport};
pub use setpoint::{ControlSetpoint, Mode};
pub use shared::{SetpointCell, SharedState, StateSnapshot, Versioned};
