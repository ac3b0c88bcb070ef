// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-point scalar types used on the control path.
//!
//! No floating point is used between the encoder and the PWM compare register, so control
//! behavior is bit-reproducible on the MCU and on the host.
//!
//! | Alias | Format | Used for |
//! | ----- | ------ | -------- |
//! | [`Fx`]       | Q16.16 (`I16F16`) | setpoint targets, velocity, duty, config fractions |
//! | [`Wide`]     | Q32.32 (`I32F32`) | PID gains, integral, intermediate products |
//! | [`WireDuty`] | Q2.14 (`I2F14`)   | duty and servo position on the wire (1.0 == `0x4000`) |

use fixed::types::{I16F16, I2F14, I32F32};

/// External fixed-point scalar, Q16.16.
pub type Fx = I16F16;

/// Internal accumulator, Q32.32.
pub type Wide = I32F32;

/// Two-byte wire encoding for values in `[-1.0, 1.0]`, Q2.14.
pub type WireDuty = I2F14;

/// Widen a Q16.16 value without loss.
#[inline]
pub fn widen(x: Fx) -> Wide {
    Wide::from_num(x)
}

/// Narrow a Q32.32 value, saturating at the Q16.16 range.
#[inline]
pub fn narrow(x: Wide) -> Fx {
    Fx::saturating_from_num(x)
}

/// Clamp to the normalized actuator range `[-1.0, 1.0]`.
#[inline]
pub fn clamp_unit(x: Fx) -> Fx {
    x.clamp(Fx::NEG_ONE, Fx::ONE)
}

/// Encode a normalized value for the wire, clamping to `[-1.0, 1.0]` first.
#[inline]
pub fn to_wire_duty(x: Fx) -> WireDuty {
    WireDuty::saturating_from_num(clamp_unit(x))
}

/// Decode a wire value back to Q16.16. Exact: every Q2.14 value is representable.
#[inline]
pub fn from_wire_duty(x: WireDuty) -> Fx {
    Fx::from_num(x)
}
