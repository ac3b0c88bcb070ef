// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Hobby servo channel.
//!
//! Standard servos take one pulse per 20 ms frame, 1–2 ms wide. A normalized position in
//! `[-1, 1]` is interpolated linearly across the configured pulse range:
//!
//! | position | pulse (default) |
//! | -------- | --------------- |
//! | -1.0     | 1000 µs         |
//! |  0.0     | 1500 µs         |
//! | +1.0     | 2000 µs         |

use crate::config::ServoConfig;
use crate::drivers::PulseOutput;
use crate::error::HwError;
use crate::units::{clamp_unit, Fx};

pub struct Servo<P> {
    output: P,
    config: ServoConfig,
    position: Option<Fx>,
}

impl<P: PulseOutput> Servo<P> {
    /// Create a servo channel. The pulse stays off until the first position is set.
    pub fn new(output: P, config: ServoConfig) -> Self {
        Self {
            output,
            config,
            position: None,
        }
    }

    /// Pulse width in microseconds for a normalized position.
    pub fn pulse_us_for(config: &ServoConfig, position: Fx) -> u16 {
        let min = i32::from(config.min_pulse_us);
        let max = i32::from(config.max_pulse_us);
        let centre = (min + max) / 2;
        let half = (max - min) / 2;
        let offset = clamp_unit(position).saturating_mul_int(half).round().to_num::<i32>();
        (centre + offset).clamp(min, max) as u16
    }

    /// Move to `position` in `[-1, 1]`.
    pub fn set_position(&mut self, position: Fx) -> Result<(), HwError> {
        let position = clamp_unit(position);
        let pulse_us = Self::pulse_us_for(&self.config, position);
        let compare = u32::from(pulse_us) * u32::from(self.output.max_duty())
            / u32::from(self.config.frame_us.max(1));
        self.output.set_pulse(compare.min(u32::from(u16::MAX)) as u16)?;
        self.position = Some(position);
        Ok(())
    }

    /// Stop emitting pulses; the servo goes limp.
    pub fn release(&mut self) -> Result<(), HwError> {
        self.output.set_pulse(0)?;
        self.position = None;
        Ok(())
    }

    /// Last commanded position, `None` while released.
    #[inline]
    pub fn position(&self) -> Option<Fx> {
        self.position
    }

    #[inline]
    pub fn output(&self) -> &P {
        &self.output
    }

    #[inline]
    pub fn output_mut(&mut self) -> &mut P {
        &mut self.output
    }
}
