// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Firmware configuration.
//!
//! Every gain, rate and threshold used by the control path is a named field here. Defaults suit
//! a small gearmotor with a 16-bit encoder timer at a 1 kHz control tick; boards override them
//! with the `with_*` setters and must pass [`ControlConfig::validate`] before the scheduler is
//! built.
//!
//! Fractional defaults are built from integer ratios so no float conversion runs on the MCU.

use crate::error::ConfigError;
use crate::units::{Fx, Wide};

/// Peripheral timer clock after the oscillator setup (HSI, no prescaling).
pub const TIMER_CLOCK_HZ: u32 = 16_000_000;

/// Control tick rate.
pub const TICK_HZ: u32 = 1_000;

/// Servo PWM frame rate.
pub const SERVO_FRAME_HZ: u32 = 50;

/// Drive motor PWM carrier frequency.
pub const MOTOR_PWM_HZ: u32 = 20_000;

/// Command link baud rate.
pub const COMMAND_BAUD: u32 = 115_200;

/// Quadrature estimator settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Largest |delta| in counts per tick accepted as real motion.
    pub max_step: u32,
    /// Single-pole low-pass coefficient applied to velocity, in (0, 1]. 1 disables filtering.
    pub smoothing: Fx,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_step: 200,
            smoothing: Fx::ONE / 4,
        }
    }
}

impl EncoderConfig {
    pub fn with_max_step(mut self, counts: u32) -> Self {
        self.max_step = counts;
        self
    }

    pub fn with_smoothing(mut self, alpha: Fx) -> Self {
        self.smoothing = alpha;
        self
    }
}

/// PID gains.
///
/// The output is a normalized duty, so gains are in duty per unit of feedback: duty per count in
/// position hold, duty per count/tick in velocity hold.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidGains {
    pub kp: Wide,
    pub ki: Wide,
    pub kd: Wide,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: Wide::ONE / 500,
            ki: Wide::ONE / 2_000,
            kd: Wide::ZERO,
        }
    }
}

impl PidGains {
    pub fn new(kp: Wide, ki: Wide, kd: Wide) -> Self {
        Self { kp, ki, kd }
    }
}

/// PWM stage limits. Pulse bounds are fractions of the PWM period.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriveConfig {
    /// Largest change of applied duty between consecutive ticks.
    pub max_slew: Fx,
    /// |duty| below this drives a zero pulse.
    pub dead_band: Fx,
    /// Pulse width emitted for the smallest duty above the dead-band.
    pub min_pulse: Fx,
    /// Pulse width emitted at |duty| == 1.0.
    pub max_pulse: Fx,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_slew: Fx::ONE / 50,
            dead_band: Fx::from_num(3) / 100,
            min_pulse: Fx::ZERO,
            // Leave headroom for the bootstrap capacitor of the high-side driver.
            max_pulse: Fx::from_num(95) / 100,
        }
    }
}

impl DriveConfig {
    pub fn with_max_slew(mut self, delta: Fx) -> Self {
        self.max_slew = delta;
        self
    }

    pub fn with_dead_band(mut self, band: Fx) -> Self {
        self.dead_band = band;
        self
    }

    pub fn with_pulse_range(mut self, min: Fx, max: Fx) -> Self {
        self.min_pulse = min;
        self.max_pulse = max;
        self
    }
}

/// Hobby servo pulse timing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ServoConfig {
    pub min_pulse_us: u16,
    pub max_pulse_us: u16,
    pub frame_us: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_pulse_us: 1_000,
            max_pulse_us: 2_000,
            frame_us: (1_000_000 / SERVO_FRAME_HZ) as u16,
        }
    }
}

/// Control tick and supervision settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_hz: u32,
    /// Ticks after the last SetSetpoint before the link is considered lost.
    pub stale_timeout_ticks: u32,
    /// Glitches inside the window that trip the Faulted state.
    pub glitch_burst: u8,
    /// Sliding window, in ticks, over which glitches are counted (max 64).
    pub glitch_window_ticks: u8,
    /// Ticks between unsolicited telemetry reports.
    pub telemetry_interval_ticks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_hz: TICK_HZ,
            stale_timeout_ticks: TICK_HZ / 4,
            glitch_burst: 5,
            glitch_window_ticks: 16,
            telemetry_interval_ticks: TICK_HZ / 20,
        }
    }
}

impl SchedulerConfig {
    pub fn with_stale_timeout(mut self, ticks: u32) -> Self {
        self.stale_timeout_ticks = ticks;
        self
    }

    pub fn with_glitch_burst(mut self, burst: u8, window_ticks: u8) -> Self {
        self.glitch_burst = burst;
        self.glitch_window_ticks = window_ticks;
        self
    }

    pub fn with_telemetry_interval(mut self, ticks: u32) -> Self {
        self.telemetry_interval_ticks = ticks;
        self
    }

    /// Tick period in seconds.
    pub fn tick_period(&self) -> Wide {
        Wide::ONE / i64::from(self.tick_hz.max(1))
    }

    /// Tick rate as a multiplier (1 / period).
    pub fn tick_rate(&self) -> Wide {
        Wide::from_num(self.tick_hz)
    }
}

/// Complete firmware configuration.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct ControlConfig {
    pub encoder: EncoderConfig,
    pub gains: PidGains,
    pub drive: DriveConfig,
    pub servo: ServoConfig,
    pub scheduler: SchedulerConfig,
}

impl ControlConfig {
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_gains(mut self, gains: PidGains) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_drive(mut self, drive: DriveConfig) -> Self {
        self.drive = drive;
        self
    }

    pub fn with_servo(mut self, servo: ServoConfig) -> Self {
        self.servo = servo;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Check every cross-field constraint the control path relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scheduler;
        if s.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if s.stale_timeout_ticks == 0 {
            return Err(ConfigError::ZeroStaleTimeout);
        }
        if s.telemetry_interval_ticks == 0 {
            return Err(ConfigError::ZeroTelemetryInterval);
        }
        if s.glitch_window_ticks == 0
            || s.glitch_window_ticks > 64
            || s.glitch_burst == 0
            || s.glitch_burst > s.glitch_window_ticks
        {
            return Err(ConfigError::GlitchWindow);
        }

        let e = &self.encoder;
        // Velocity is at most one plausible step per tick and must fit Q16.16.
        if e.max_step == 0 || e.max_step > i16::MAX as u32 {
            return Err(ConfigError::PlausibleStep);
        }
        if e.smoothing <= Fx::ZERO || e.smoothing > Fx::ONE {
            return Err(ConfigError::Smoothing);
        }

        let d = &self.drive;
        if d.max_slew <= Fx::ZERO || d.max_slew > Fx::from_num(2) {
            return Err(ConfigError::SlewLimit);
        }
        if d.dead_band < Fx::ZERO || d.dead_band >= Fx::ONE {
            return Err(ConfigError::DeadBand);
        }
        if d.min_pulse < Fx::ZERO || d.min_pulse > d.max_pulse || d.max_pulse > Fx::ONE {
            return Err(ConfigError::PulseRange);
        }

        let v = &self.servo;
        if v.min_pulse_us >= v.max_pulse_us || v.max_pulse_us >= v.frame_us {
            return Err(ConfigError::ServoRange);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ControlConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_tick_period_is_one_millisecond() {
        let period = SchedulerConfig::default().tick_period();
        assert!((period.to_num::<f64>() - 0.001).abs() < 1e-9);
    }

    #[test]
    fn rejects_zero_tick_rate() {
        let cfg = ControlConfig::default().with_scheduler(SchedulerConfig {
            tick_hz: 0,
            ..Default::default()
        });
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTickRate));
    }

    #[test]
    fn rejects_step_beyond_velocity_range() {
        let cfg = ControlConfig::default().with_encoder(EncoderConfig::default().with_max_step(40_000));
        assert_eq!(cfg.validate(), Err(ConfigError::PlausibleStep));
        let cfg = ControlConfig::default().with_encoder(EncoderConfig::default().with_max_step(32_767));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_burst_larger_than_window() {
        let cfg = ControlConfig::default()
            .with_scheduler(SchedulerConfig::default().with_glitch_burst(10, 4));
        assert_eq!(cfg.validate(), Err(ConfigError::GlitchWindow));
    }

    #[test]
    fn rejects_inverted_pulse_range() {
        let cfg = ControlConfig::default().with_drive(
            DriveConfig::default().with_pulse_range(Fx::from_num(0.8), Fx::from_num(0.2)),
        );
        assert_eq!(cfg.validate(), Err(ConfigError::PulseRange));
    }

    #[test]
    fn rejects_zero_slew() {
        let cfg =
            ControlConfig::default().with_drive(DriveConfig::default().with_max_slew(Fx::ZERO));
        assert_eq!(cfg.validate(), Err(ConfigError::SlewLimit));
    }

    #[test]
    fn rejects_servo_pulse_longer_than_frame() {
        let cfg = ControlConfig::default().with_servo(ServoConfig {
            min_pulse_us: 1_000,
            max_pulse_us: 30_000,
            frame_us: 20_000,
        });
        assert_eq!(cfg.validate(), Err(ConfigError::ServoRange));
    }
}
