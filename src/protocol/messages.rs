// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command message protocol used to communicate with the motor controller.
//!
//! Frame layout:
//!
//! ```text
//! [SYNC][id][len][payload: len bytes][checksum]
//! ```
//!
//! `checksum` is the sum of every preceding byte, SYNC included, mod 256. Multi-byte fields are
//! little-endian. Payload lengths are fixed per id.
//!
//! | id   | name             | payload |
//! | ---- | ---------------- | ------- |
//! | 0x01 | SetSetpoint      | mode: u8, target: Q16.16 (4) |
//! | 0x02 | RequestTelemetry | — |
//! | 0x03 | Reset            | — |
//! | 0x04 | SetServo         | position: Q2.14 (2) |
//! | 0x05 | ZeroEncoder      | — |
//! | 0x81 | Telemetry        | position: i32, velocity: Q16.16, setpoint: Q16.16, duty: Q2.14, faults: u8 |

use crate::control::setpoint::Mode;
use crate::error::FrameError;
use crate::units::{from_wire_duty, to_wire_duty, Fx, WireDuty};

/// Sync byte for the protocol.
pub const SYNC: u8 = 0xA5;

// Message IDs
pub const MSG_SET_SETPOINT: u8 = 0x01;
pub const MSG_REQUEST_TELEMETRY: u8 = 0x02;
pub const MSG_RESET: u8 = 0x03;
pub const MSG_SET_SERVO: u8 = 0x04;
pub const MSG_ZERO_ENCODER: u8 = 0x05;
pub const MSG_TELEMETRY: u8 = 0x81;

/// Largest payload of any message (telemetry).
pub const MAX_PAYLOAD: usize = 15;
/// SYNC + id + len + checksum.
pub const FRAME_OVERHEAD: usize = 4;
pub const MAX_FRAME: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

/// Payload length of a known message id.
pub const fn payload_len(id: u8) -> Option<u8> {
    match id {
        MSG_SET_SETPOINT => Some(5),
        MSG_REQUEST_TELEMETRY | MSG_RESET | MSG_ZERO_ENCODER => Some(0),
        MSG_SET_SERVO => Some(2),
        MSG_TELEMETRY => Some(MAX_PAYLOAD as u8),
        _ => None,
    }
}

/// Sum of `bytes` mod 256.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// One encoded frame, envelope and checksum included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buf: [u8; MAX_FRAME],
    len: usize,
}

impl Frame {
    /// Wrap `payload` in the frame envelope. Payload beyond [`MAX_PAYLOAD`] is dropped.
    pub fn new(id: u8, payload: &[u8]) -> Self {
        let n = payload.len().min(MAX_PAYLOAD);
        let mut buf = [0u8; MAX_FRAME];
        buf[0] = SYNC;
        buf[1] = id;
        buf[2] = n as u8;
        buf[3..3 + n].copy_from_slice(&payload[..n]);
        buf[3 + n] = checksum(&buf[..3 + n]);
        Self {
            buf,
            len: n + FRAME_OVERHEAD,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Commands accepted from the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetSetpoint { mode: Mode, target: Fx },
    RequestTelemetry,
    Reset,
    /// Servo position in `[-1, 1]`.
    SetServo { position: Fx },
    ZeroEncoder,
}

impl Command {
    pub fn id(&self) -> u8 {
        match self {
            Command::SetSetpoint { .. } => MSG_SET_SETPOINT,
            Command::RequestTelemetry => MSG_REQUEST_TELEMETRY,
            Command::Reset => MSG_RESET,
            Command::SetServo { .. } => MSG_SET_SERVO,
            Command::ZeroEncoder => MSG_ZERO_ENCODER,
        }
    }

    /// Encode as a wire frame. Servo positions are rounded to Q2.14.
    pub fn encode(&self) -> Frame {
        match *self {
            Command::SetSetpoint { mode, target } => {
                let t = target.to_le_bytes();
                Frame::new(self.id(), &[mode.to_wire(), t[0], t[1], t[2], t[3]])
            }
            Command::SetServo { position } => {
                Frame::new(self.id(), &to_wire_duty(position).to_le_bytes())
            }
            Command::RequestTelemetry | Command::Reset | Command::ZeroEncoder => {
                Frame::new(self.id(), &[])
            }
        }
    }

    /// Decode a command from its id and payload.
    pub fn decode(id: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let expected = match payload_len(id) {
            Some(len) if id != MSG_TELEMETRY => len,
            _ => return Err(FrameError::UnknownCommand(id)),
        };
        if payload.len() != usize::from(expected) {
            return Err(FrameError::LengthMismatch {
                id,
                expected,
                found: payload.len() as u8,
            });
        }

        match id {
            MSG_SET_SETPOINT => {
                let mode = Mode::from_wire(payload[0])?;
                let target = Fx::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
                Ok(Command::SetSetpoint { mode, target })
            }
            MSG_REQUEST_TELEMETRY => Ok(Command::RequestTelemetry),
            MSG_RESET => Ok(Command::Reset),
            MSG_SET_SERVO => {
                let raw = WireDuty::from_le_bytes([payload[0], payload[1]]);
                Ok(Command::SetServo {
                    position: from_wire_duty(raw),
                })
            }
            MSG_ZERO_ENCODER => Ok(Command::ZeroEncoder),
            other => Err(FrameError::UnknownCommand(other)),
        }
    }
}
