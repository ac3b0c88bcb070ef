// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Slew-limited PWM drive for a brushed DC motor behind a PWM + DIR H-bridge.
//!
//! The driver keeps the duty it applied on the previous tick and moves toward each new command
//! by at most `max_slew`, so a full reversal takes `2 / max_slew` ticks. The applied duty is then
//! mapped to a compare value:
//!
//! - `|duty|` below the dead-band, or zero: compare 0, direction neutral;
//! - otherwise `min_pulse + |duty| * (max_pulse - min_pulse)` of the PWM period, direction from
//!   the sign.
//!
//! A disabled command bypasses the ramp and stops the bridge at once.
//!
//! Inside the dead-band the ramp keeps its sub-band duty so a slew step smaller than the
//! dead-band still climbs out of it; [`MotorDriver::effective_duty`] reports what the bridge sees.

use crate::config::DriveConfig;
use crate::control::pid::ActuatorCommand;
use crate::drivers::{Direction, MotorOutput};
use crate::error::HwError;
use crate::units::{clamp_unit, widen, Fx};

pub struct MotorDriver<M> {
    output: M,
    config: DriveConfig,
    applied: Fx,
    compare: u16,
    direction: Direction,
}

impl<M: MotorOutput> MotorDriver<M> {
    pub fn new(output: M, config: DriveConfig) -> Self {
        Self {
            output,
            config,
            applied: Fx::ZERO,
            compare: 0,
            direction: Direction::Neutral,
        }
    }

    /// Apply one tick's command.
    ///
    /// On error the previously applied duty is kept as the ramp origin; the caller is expected
    /// to treat the failure as a hardware fault and [`stop`](Self::stop).
    pub fn apply(&mut self, command: ActuatorCommand) -> Result<(), HwError> {
        if !command.enabled {
            return self.stop();
        }

        let target = clamp_unit(command.duty);
        let limit = self.config.max_slew;
        let step = target.saturating_sub(self.applied).clamp(-limit, limit);
        let applied = clamp_unit(self.applied.saturating_add(step));

        let magnitude = applied.abs();
        let (compare, direction) = if magnitude == Fx::ZERO || magnitude < self.config.dead_band {
            (0, Direction::Neutral)
        } else if applied.is_negative() {
            (self.compare_for(magnitude), Direction::Reverse)
        } else {
            (self.compare_for(magnitude), Direction::Forward)
        };

        self.write(compare, direction)?;
        self.applied = applied;
        Ok(())
    }

    /// Zero the output and drive the direction line neutral, bypassing the ramp.
    pub fn stop(&mut self) -> Result<(), HwError> {
        self.write(0, Direction::Neutral)?;
        self.applied = Fx::ZERO;
        Ok(())
    }

    /// Duty applied on the last successful tick, after slew limiting.
    ///
    /// This is the ramp position. Inside the dead-band it is non-zero while the bridge is off.
    #[inline]
    pub fn applied_duty(&self) -> Fx {
        self.applied
    }

    /// Duty the bridge is actually driven at: zero while the compare value is zero.
    #[inline]
    pub fn effective_duty(&self) -> Fx {
        if self.compare == 0 {
            Fx::ZERO
        } else {
            self.applied
        }
    }

    #[inline]
    pub fn compare(&self) -> u16 {
        self.compare
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn output(&self) -> &M {
        &self.output
    }

    #[inline]
    pub fn output_mut(&mut self) -> &mut M {
        &mut self.output
    }

    /// Compare value for a duty magnitude in `(0, 1]`.
    fn compare_for(&self, magnitude: Fx) -> u16 {
        let span = self.config.max_pulse.saturating_sub(self.config.min_pulse);
        let fraction = widen(self.config.min_pulse).saturating_add(widen(magnitude).saturating_mul(widen(span)));
        let max = self.output.max_duty();
        fraction
            .saturating_mul_int(i64::from(max))
            .round()
            .saturating_to_num::<u16>()
            .min(max)
    }

    fn write(&mut self, compare: u16, direction: Direction) -> Result<(), HwError> {
        // Never change direction with the bridge driven.
        if direction != self.direction {
            self.output.set_duty(0)?;
            self.compare = 0;
            self.output.set_direction(direction)?;
            self.direction = direction;
        }
        if compare != self.compare {
            self.output.set_duty(compare)?;
            self.compare = compare;
        }
        Ok(())
    }
}
