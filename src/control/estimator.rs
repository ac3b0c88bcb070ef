// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature position and velocity estimation.
//!
//! Once per control tick the estimator reads the free-running hardware counter, unwraps the
//! delta against the counter's bit width, and accumulates it into a 32-bit position. Velocity is
//! the per-tick delta in counts/tick, smoothed by a single-pole low-pass filter:
//!
//! ```text
//! v[n] = v[n-1] + alpha * (delta - v[n-1])
//! ```
//!
//! Accepted deltas never exceed the plausible step, so the filtered value always fits Q16.16.
//!
//! A delta larger than the configured plausible step is a glitch: position and velocity hold
//! their previous values and the returned state is flagged. The counter reference is resynced so
//! a single miscount is not reported again on the following tick.

use crate::config::EncoderConfig;
use crate::drivers::QuadratureCounter;
use crate::units::{narrow, widen, Fx, Wide};

/// Estimator output for one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncoderState {
    /// Last raw counter value, masked to the counter width.
    pub raw_count: u32,
    /// Accumulated, unwrapped position in counts.
    pub position: i32,
    /// Filtered velocity in counts/tick.
    pub velocity: Fx,
    /// This tick's delta was rejected as implausible.
    pub glitch: bool,
}

/// Signed difference `current - previous` of a `bits`-wide wrapping counter.
#[inline]
pub fn wrapped_delta(current: u32, previous: u32, bits: u32) -> i32 {
    let shift = 32 - bits.clamp(1, 32);
    ((current.wrapping_sub(previous) << shift) as i32) >> shift
}

pub struct EncoderEstimator<Q> {
    counter: Q,
    config: EncoderConfig,
    previous_raw: u32,
    position: i32,
    velocity: Wide,
    glitches: u32,
    last: EncoderState,
}

impl<Q: QuadratureCounter> EncoderEstimator<Q> {
    const MASK: u32 = u32::MAX >> (32 - Q::BITS);

    /// Create an estimator. The current counter value becomes position zero.
    pub fn new(mut counter: Q, config: EncoderConfig) -> Self {
        let raw = counter.read() & Self::MASK;
        Self {
            counter,
            config,
            previous_raw: raw,
            position: 0,
            velocity: Wide::ZERO,
            glitches: 0,
            last: EncoderState {
                raw_count: raw,
                position: 0,
                velocity: Fx::ZERO,
                glitch: false,
            },
        }
    }

    /// Sample the counter and advance the estimate by one tick.
    pub fn on_tick(&mut self) -> EncoderState {
        let raw = self.counter.read() & Self::MASK;
        let delta = wrapped_delta(raw, self.previous_raw, Q::BITS);
        self.previous_raw = raw;

        let glitch = delta.unsigned_abs() > self.config.max_step;
        if glitch {
            self.glitches = self.glitches.wrapping_add(1);
            log_debug!("encoder glitch: delta {} counts", delta);
        } else {
            self.position = self.position.wrapping_add(delta);

            let alpha = widen(self.config.smoothing);
            let step = alpha.saturating_mul(Wide::from_num(delta).saturating_sub(self.velocity));
            self.velocity = self.velocity.saturating_add(step);
        }

        self.last = EncoderState {
            raw_count: raw,
            position: self.position,
            velocity: narrow(self.velocity),
            glitch,
        };
        self.last
    }

    /// Most recent estimate without sampling the counter.
    #[inline]
    pub fn state(&self) -> EncoderState {
        self.last
    }

    /// Re-zero the accumulated position at the current shaft angle.
    pub fn zero(&mut self) {
        self.position = 0;
        self.last.position = 0;
    }

    /// Total glitches since startup.
    #[inline]
    pub fn glitch_count(&self) -> u32 {
        self.glitches
    }

    #[inline]
    pub fn counter_mut(&mut self) -> &mut Q {
        &mut self.counter
    }
}
