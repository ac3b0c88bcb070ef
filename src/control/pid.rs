// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PID controller for the drive motor.
//!
//! Works in `no_std`, does not allocate, and runs entirely in Q32.32 fixed point.
//!
//! Each tick the controller turns the current setpoint and encoder estimate into an
//! [`ActuatorCommand`]:
//!
//! - `Disabled`, or a setpoint older than the staleness timeout: neutral output, state cleared.
//! - `OpenLoopDuty`: the target is passed through as duty, clamped to `[-1, 1]`.
//! - `PositionHold` / `VelocityHold`: `u = Kp*e + Ki*I + Kd*de/dt`, clamped to `[-1, 1]`.
//!
//! Anti-windup is conditional integration: `I += e*dt` only on ticks whose unclamped output is
//! inside the actuator range. Any mode change clears the integrator and the derivative history,
//! and the first closed-loop tick after a clear has no derivative term.

use crate::config::{PidGains, SchedulerConfig};
use crate::control::estimator::EncoderState;
use crate::control::setpoint::{ControlSetpoint, Mode};
use crate::drivers::Direction;
use crate::units::{clamp_unit, narrow, widen, Fx, Wide};

/// Duty request for the motor driver, produced once per tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActuatorCommand {
    /// Signed duty in `[-1, 1]`.
    pub duty: Fx,
    /// False requests an immediate stop instead of a slew-limited duty.
    pub enabled: bool,
}

impl ActuatorCommand {
    pub const NEUTRAL: Self = Self {
        duty: Fx::ZERO,
        enabled: false,
    };

    /// An enabled command, clamped to `[-1, 1]`.
    pub fn drive(duty: Fx) -> Self {
        Self {
            duty: clamp_unit(duty),
            enabled: true,
        }
    }

    /// Direction implied by the sign of `duty`.
    pub fn direction(&self) -> Direction {
        if !self.enabled || self.duty == Fx::ZERO {
            Direction::Neutral
        } else if self.duty.is_negative() {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// PID internal state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Integral of error over time (error units * s).
    pub integral_accumulator: Wide,
    pub previous_error: Wide,
    pub last_output: Fx,
}

pub struct PidController {
    gains: PidGains,
    tick_period: Wide,
    tick_rate: Wide,
    stale_timeout_ticks: u32,

    state: ControllerState,
    mode: Mode,
    /// `previous_error` holds a real sample (derivative term allowed).
    primed: bool,
    /// Unclamped output of the last closed-loop tick.
    last_unclamped: Wide,
}

impl PidController {
    pub fn new(gains: PidGains, scheduler: &SchedulerConfig) -> Self {
        Self {
            gains,
            tick_period: scheduler.tick_period(),
            tick_rate: scheduler.tick_rate(),
            stale_timeout_ticks: scheduler.stale_timeout_ticks,
            state: ControllerState::default(),
            mode: Mode::Disabled,
            primed: false,
            last_unclamped: Wide::ZERO,
        }
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.state.integral_accumulator = Wide::ZERO;
        self.state.previous_error = Wide::ZERO;
        self.primed = false;
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Mode the controller acted on during the last tick (stale setpoints count as `Disabled`).
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn last_unclamped(&self) -> Wide {
        self.last_unclamped
    }

    /// True if the setpoint is too old to act on at tick `now`.
    #[inline]
    pub fn is_stale(&self, setpoint: &ControlSetpoint, now: u32) -> bool {
        setpoint.is_stale(now, self.stale_timeout_ticks)
    }

    /// Compute this tick's actuator command.
    pub fn on_tick(
        &mut self,
        setpoint: &ControlSetpoint,
        estimate: &EncoderState,
        now: u32,
    ) -> ActuatorCommand {
        let mode = if self.is_stale(setpoint, now) {
            Mode::Disabled
        } else {
            setpoint.mode
        };

        if mode != self.mode {
            log_info!("controller mode {:?} -> {:?}", self.mode, mode);
            self.reset();
            self.mode = mode;
        }

        match mode {
            Mode::Disabled => {
                self.reset();
                self.last_unclamped = Wide::ZERO;
                self.state.last_output = Fx::ZERO;
                ActuatorCommand::NEUTRAL
            }
            Mode::OpenLoopDuty => {
                let command = ActuatorCommand::drive(setpoint.target);
                self.last_unclamped = widen(setpoint.target);
                self.state.last_output = command.duty;
                command
            }
            Mode::PositionHold => {
                let feedback = Wide::from_num(estimate.position);
                ActuatorCommand::drive(self.closed_loop(widen(setpoint.target), feedback))
            }
            Mode::VelocityHold => {
                let feedback = widen(estimate.velocity);
                ActuatorCommand::drive(self.closed_loop(widen(setpoint.target), feedback))
            }
        }
    }

    fn closed_loop(&mut self, target: Wide, feedback: Wide) -> Fx {
        let error = target.saturating_sub(feedback);

        // ----- P term -----
        let p = self.gains.kp.saturating_mul(error);

        // ----- I term -----
        let i = self
            .gains
            .ki
            .saturating_mul(self.state.integral_accumulator);

        // ----- D term -----
        let d = if self.primed {
            let de = error.saturating_sub(self.state.previous_error);
            self.gains.kd.saturating_mul(de.saturating_mul(self.tick_rate))
        } else {
            Wide::ZERO
        };

        let unclamped = p.saturating_add(i).saturating_add(d);

        // Conditional integration
        if unclamped >= Wide::NEG_ONE && unclamped <= Wide::ONE {
            let step = error.saturating_mul(self.tick_period);
            self.state.integral_accumulator = self.state.integral_accumulator.saturating_add(step);
        }

        let out = narrow(unclamped.clamp(Wide::NEG_ONE, Wide::ONE));

        self.state.previous_error = error;
        self.state.last_output = out;
        self.last_unclamped = unclamped;
        self.primed = true;

        out
    }
}
