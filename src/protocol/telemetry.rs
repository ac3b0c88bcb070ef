// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Telemetry frame (id 0x81).
//!
//! Payload, little-endian, 15 bytes:
//!
//! ```text
//! [position: i32][velocity: Q16.16][setpoint: Q16.16][duty: Q2.14][faults: u8]
//! ```

use crate::control::fault::FaultFlags;
use crate::control::shared::StateSnapshot;
use crate::error::FrameError;
use crate::protocol::messages::{Frame, MAX_PAYLOAD, MSG_TELEMETRY};
use crate::units::{from_wire_duty, to_wire_duty, Fx, WireDuty};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// Accumulated encoder counts.
    pub position: i32,
    /// Counts per second.
    pub velocity: Fx,
    /// Target of the active setpoint.
    pub setpoint_echo: Fx,
    /// Signed duty actually applied, `[-1, 1]`.
    pub actuator_duty: Fx,
    pub fault_flags: FaultFlags,
}

impl TelemetryFrame {
    /// Build a report from a published snapshot plus flags latched outside the tick.
    pub fn from_snapshot(snapshot: &StateSnapshot, latched: FaultFlags) -> Self {
        Self {
            position: snapshot.position,
            velocity: snapshot.velocity,
            setpoint_echo: snapshot.setpoint_echo,
            actuator_duty: snapshot.applied_duty,
            fault_flags: snapshot.flags.union(latched),
        }
    }

    pub fn encode(&self) -> Frame {
        let mut payload = [0u8; MAX_PAYLOAD];
        payload[0..4].copy_from_slice(&self.position.to_le_bytes());
        payload[4..8].copy_from_slice(&self.velocity.to_le_bytes());
        payload[8..12].copy_from_slice(&self.setpoint_echo.to_le_bytes());
        payload[12..14].copy_from_slice(&to_wire_duty(self.actuator_duty).to_le_bytes());
        payload[14] = self.fault_flags.bits();
        Frame::new(MSG_TELEMETRY, &payload)
    }

    /// Decode a telemetry payload. Used on the supervisor side and in tests.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let p: &[u8; MAX_PAYLOAD] =
            payload
                .try_into()
                .map_err(|_| FrameError::LengthMismatch {
                    id: MSG_TELEMETRY,
                    expected: MAX_PAYLOAD as u8,
                    found: payload.len() as u8,
                })?;
        Ok(Self {
            position: i32::from_le_bytes([p[0], p[1], p[2], p[3]]),
            velocity: Fx::from_le_bytes([p[4], p[5], p[6], p[7]]),
            setpoint_echo: Fx::from_le_bytes([p[8], p[9], p[10], p[11]]),
            actuator_duty: from_wire_duty(WireDuty::from_le_bytes([p[12], p[13]])),
            fault_flags: FaultFlags::from_bits(p[14]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{checksum, SYNC};

    #[test]
    fn encodes_fifteen_byte_payload() {
        let t = TelemetryFrame {
            position: -2,
            velocity: Fx::from_num(1.5),
            setpoint_echo: Fx::ZERO,
            actuator_duty: Fx::ONE,
            fault_flags: FaultFlags::SETPOINT_STALE,
        };
        let f = t.encode();
        let b = f.as_bytes();
        assert_eq!(b.len(), 19);
        assert_eq!(&b[..3], &[SYNC, MSG_TELEMETRY, 15]);
        assert_eq!(&b[3..7], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&b[7..11], &[0x00, 0x80, 0x01, 0x00]);
        assert_eq!(&b[15..17], &[0x00, 0x40]);
        assert_eq!(b[17], 0x02);
        assert_eq!(b[18], checksum(&b[..18]));
        assert_eq!(TelemetryFrame::decode(&b[3..18]), Ok(t));
    }

    #[test]
    fn snapshot_flags_merge_with_latched() {
        let snap = StateSnapshot {
            position: 12,
            flags: FaultFlags::SETPOINT_STALE,
            ..StateSnapshot::INITIAL
        };
        let t = TelemetryFrame::from_snapshot(&snap, FaultFlags::FRAME_ERROR);
        assert_eq!(t.position, 12);
        assert!(t.fault_flags.contains(FaultFlags::SETPOINT_STALE));
        assert!(t.fault_flags.contains(FaultFlags::FRAME_ERROR));
    }

    #[test]
    fn short_payload_is_rejected() {
        assert!(TelemetryFrame::decode(&[0; 4]).is_err());
    }
}
