// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control scheduler: the body of the periodic control-tick interrupt.
//!
//! ```text
//!            start()                     hardware fault / glitch burst
//!   Idle ─────────────► Running ─────────────────────────────────► Faulted
//!                          ▲                                          │
//!                          └───────────── Reset command ──────────────┘
//! ```
//!
//! While Running, each tick:
//!
//! 1. copies the setpoint out of the [`SharedState`] handoff,
//! 2. samples the [`EncoderEstimator`],
//! 3. runs the [`PidController`],
//! 4. applies the command through the [`MotorDriver`] and refreshes the servo,
//! 5. publishes a [`StateSnapshot`] and flags telemetry when the reporting interval elapses.
//!
//! Idle and Faulted ticks keep the actuators neutral but still sample the encoder and publish
//! snapshots, so position tracks the shaft through a fault and the supervisor can observe it.
//! Every path runs to completion; nothing blocks.

use crate::config::{ControlConfig, SchedulerConfig};
use crate::control::estimator::{EncoderEstimator, EncoderState};
use crate::control::fault::{FaultCause, FaultFlags};
use crate::control::pid::{ActuatorCommand, PidController};
use crate::control::setpoint::{ControlSetpoint, Mode};
use crate::control::shared::{SharedState, StateSnapshot};
use crate::drivers::{MotorOutput, PulseOutput, QuadratureCounter};
use crate::error::ConfigError;
use crate::motors::{MotorDriver, Servo};
use crate::units::Fx;

/// Scheduler state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Hardware not yet reported ready; actuators neutral.
    Idle,
    /// Closed-loop control active.
    Running,
    /// Actuators forced neutral until a Reset command.
    Faulted(FaultCause),
}

/// Result of one control tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u32,
    pub state: SchedulerState,
    /// Command produced by the controller, `NEUTRAL` when not Running.
    pub command: ActuatorCommand,
    pub encoder: EncoderState,
    /// The reporting interval elapsed on this tick.
    pub telemetry_due: bool,
}

/// Sliding window of per-tick glitch bits.
#[derive(Copy, Clone, Debug, Default)]
struct GlitchWindow {
    history: u64,
    mask: u64,
}

impl GlitchWindow {
    fn new(window_ticks: u8) -> Self {
        let mask = if window_ticks >= 64 {
            u64::MAX
        } else {
            (1u64 << window_ticks) - 1
        };
        Self { history: 0, mask }
    }

    /// Record one tick and return the glitch count inside the window.
    fn record(&mut self, glitch: bool) -> u32 {
        self.history = ((self.history << 1) | u64::from(glitch)) & self.mask;
        self.history.count_ones()
    }

    fn clear(&mut self) {
        self.history = 0;
    }
}

pub struct ControlScheduler<Q, M, S> {
    config: SchedulerConfig,
    state: SchedulerState,

    estimator: EncoderEstimator<Q>,
    controller: PidController,
    motor: MotorDriver<M>,
    servo: Servo<S>,

    tick: u32,
    last_report: u32,
    glitches: GlitchWindow,
    /// Glitches since the last reset, reported in the snapshot.
    glitch_count: u32,
    reset_epoch: u32,
    stale: bool,
    setpoint: ControlSetpoint,
    setpoint_version: u32,
    servo_target: Option<Fx>,
}

impl<Q, M, S> ControlScheduler<Q, M, S>
where
    Q: QuadratureCounter,
    M: MotorOutput,
    S: PulseOutput,
{
    /// Build the scheduler in the Idle state from validated configuration.
    pub fn new(config: &ControlConfig, counter: Q, motor: M, servo: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let sched = config.scheduler;
        Ok(Self {
            config: sched,
            state: SchedulerState::Idle,
            estimator: EncoderEstimator::new(counter, config.encoder),
            controller: PidController::new(config.gains, &sched),
            motor: MotorDriver::new(motor, config.drive),
            servo: Servo::new(servo, config.servo),
            tick: 0,
            last_report: 0,
            glitches: GlitchWindow::new(sched.glitch_window_ticks),
            glitch_count: 0,
            reset_epoch: 0,
            stale: false,
            setpoint: ControlSetpoint::DISABLED,
            setpoint_version: 0,
            servo_target: None,
        })
    }

    /// Idle → Running, once clock, PWM and encoder initialization report ready.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Idle {
            log_info!("scheduler: Idle -> Running");
            self.state = SchedulerState::Running;
        }
    }

    /// Clear faults and latched state. Faulted → Running; Idle stays Idle.
    pub fn reset(&mut self) {
        if let SchedulerState::Faulted(cause) = self.state {
            log_info!("scheduler: reset from fault {:?}", cause);
            self.state = SchedulerState::Running;
        }
        self.controller.reset();
        self.glitches.clear();
        self.glitch_count = 0;
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
        self.stale = false;
    }

    /// Run one control tick.
    pub fn on_tick(&mut self, shared: &SharedState) -> TickReport {
        self.tick = self.tick.wrapping_add(1);
        let now = self.tick;
        shared.set_now(now);

        if shared.take_reset_request() {
            self.reset();
        }
        if shared.take_zero_request() {
            log_info!("encoder re-zeroed");
            self.estimator.zero();
        }

        let command = match self.state {
            SchedulerState::Running => self.run(now, shared),
            SchedulerState::Idle | SchedulerState::Faulted(_) => {
                self.estimator.on_tick();
                self.hold_neutral();
                ActuatorCommand::NEUTRAL
            }
        };

        let telemetry_due = now.wrapping_sub(self.last_report) >= self.config.telemetry_interval_ticks;
        if telemetry_due {
            self.last_report = now;
            shared.request_telemetry();
        }

        shared.publish(self.snapshot());

        TickReport {
            tick: now,
            state: self.state,
            command,
            encoder: self.estimator.state(),
            telemetry_due,
        }
    }

    fn run(&mut self, now: u32, shared: &SharedState) -> ActuatorCommand {
        let handoff = shared.setpoint().load();
        if handoff.version != self.setpoint_version {
            self.setpoint_version = handoff.version;
            log_debug!("setpoint v{} mode {:?}", handoff.version, handoff.setpoint.mode);
        }
        self.setpoint = handoff.setpoint;

        let estimate = self.estimator.on_tick();
        if estimate.glitch {
            self.glitch_count = self.glitch_count.wrapping_add(1);
        }
        if self.glitches.record(estimate.glitch) >= u32::from(self.config.glitch_burst) {
            self.fault(FaultCause::GlitchBurst);
            return ActuatorCommand::NEUTRAL;
        }

        let stale = self.setpoint.mode != Mode::Disabled && self.controller.is_stale(&self.setpoint, now);
        if stale && !self.stale {
            log_warn!("setpoint stale after {} ticks, disabling", self.setpoint.age(now));
        }
        self.stale = stale;

        let command = self.controller.on_tick(&self.setpoint, &estimate, now);
        if let Err(err) = self.motor.apply(command) {
            self.fault(FaultCause::Actuator(err));
            return ActuatorCommand::NEUTRAL;
        }

        let target = shared.servo();
        if target != self.servo_target {
            let result = match target {
                Some(position) => self.servo.set_position(position),
                None => self.servo.release(),
            };
            if let Err(err) = result {
                self.fault(FaultCause::Servo(err));
                return ActuatorCommand::NEUTRAL;
            }
            self.servo_target = target;
        }

        command
    }

    fn fault(&mut self, cause: FaultCause) {
        log_error!("scheduler: Running -> Faulted ({:?})", cause);
        self.state = SchedulerState::Faulted(cause);
        self.controller.reset();
        self.hold_neutral();
    }

    fn hold_neutral(&mut self) {
        if self.motor.stop().is_err() {
            log_error!("motor stop failed while neutral");
        }
        if self.servo.position().is_some() && self.servo.release().is_err() {
            log_error!("servo release failed while neutral");
        }
        self.servo_target = None;
    }

    fn flags(&self) -> FaultFlags {
        let mut flags = FaultFlags::empty();
        match self.state {
            SchedulerState::Idle => flags.insert(FaultFlags::IDLE),
            SchedulerState::Running => flags.set(FaultFlags::SETPOINT_STALE, self.stale),
            SchedulerState::Faulted(cause) => flags.insert(cause.flags()),
        }
        flags
    }

    /// Snapshot of the current state for telemetry.
    pub fn snapshot(&self) -> StateSnapshot {
        let encoder = self.estimator.state();
        StateSnapshot {
            tick: self.tick,
            position: encoder.position,
            velocity: encoder.velocity,
            setpoint_echo: self.setpoint.target,
            applied_duty: self.motor.effective_duty(),
            flags: self.flags(),
            glitch_count: self.glitch_count,
            reset_epoch: self.reset_epoch,
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    #[inline]
    pub fn estimator(&self) -> &EncoderEstimator<Q> {
        &self.estimator
    }

    #[inline]
    pub fn estimator_mut(&mut self) -> &mut EncoderEstimator<Q> {
        &mut self.estimator
    }

    #[inline]
    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    #[inline]
    pub fn motor(&self) -> &MotorDriver<M> {
        &self.motor
    }

    #[inline]
    pub fn motor_mut(&mut self) -> &mut MotorDriver<M> {
        &mut self.motor
    }

    #[inline]
    pub fn servo(&self) -> &Servo<S> {
        &self.servo
    }

    #[inline]
    pub fn servo_mut(&mut self) -> &mut Servo<S> {
        &mut self.servo
    }
}
