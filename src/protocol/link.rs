// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial command link.
//!
//! [`CommandLink`] runs in the serial interrupt. It turns received bytes into setpoint updates
//! and one-shot requests on the [`SharedState`], and writes telemetry frames to a [`FrameSink`].
//! It never touches the motor or the encoder directly.

use crate::control::fault::FaultFlags;
use crate::control::setpoint::{ControlSetpoint, Mode};
use crate::control::shared::SharedState;
use crate::error::FrameError;
use crate::protocol::messages::Command;
use crate::protocol::parser::Parser;
use crate::protocol::telemetry::TelemetryFrame;
use crate::units::Fx;

/// Destination for outgoing frames.
pub trait FrameSink {
    /// Queue one whole frame. A sink that cannot take the whole frame drops it.
    fn send(&mut self, bytes: &[u8]);
}

impl<const N: usize> FrameSink for heapless::Vec<u8, N> {
    fn send(&mut self, bytes: &[u8]) {
        if self.capacity() - self.len() < bytes.len() {
            return;
        }
        // Capacity checked above.
        let _ = self.extend_from_slice(bytes);
    }
}

pub struct CommandLink {
    parser: Parser,
    frame_errors: u16,
    errors_reported: u16,
    glitches_reported: u32,
    epoch_reported: u32,
}

impl Default for CommandLink {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandLink {
    pub const fn new() -> Self {
        Self {
            parser: Parser::new(),
            frame_errors: 0,
            errors_reported: 0,
            glitches_reported: 0,
            epoch_reported: 0,
        }
    }

    /// Malformed frames received since the last reset, saturating.
    #[inline]
    pub fn frame_errors(&self) -> u16 {
        self.frame_errors
    }

    /// Count receiver errors (framing, noise, overrun) reported by the UART as malformed frames.
    pub fn on_line_errors(&mut self, count: u32) {
        if count > 0 {
            let count = u16::try_from(count).unwrap_or(u16::MAX);
            self.frame_errors = self.frame_errors.saturating_add(count);
            log_debug!("{} receiver errors", count);
        }
    }

    /// Feed one received byte.
    pub fn on_byte<T: FrameSink>(&mut self, byte: u8, shared: &SharedState, tx: &mut T) {
        match self.parser.push(byte) {
            None => {}
            Some(Ok(frame)) => match Command::decode(frame.id, frame.payload()) {
                Ok(cmd) => self.dispatch(cmd, shared, tx),
                Err(e) => self.record_error(e),
            },
            Some(Err(e)) => self.record_error(e),
        }
    }

    /// Emit a periodic report if the control tick flagged one as due.
    pub fn poll<T: FrameSink>(&mut self, shared: &SharedState, tx: &mut T) {
        if shared.take_telemetry_due() {
            self.emit_telemetry(shared, tx);
        }
    }

    /// Send one telemetry frame built from the latest published snapshot.
    ///
    /// A reset that the tick has not applied yet is reported as already applied.
    pub fn emit_telemetry<T: FrameSink>(&mut self, shared: &SharedState, tx: &mut T) {
        let mut snapshot = shared.snapshot();
        if shared.reset_pending() {
            snapshot = snapshot.after_reset();
        }

        // The glitch count restarts from zero on every reset.
        let new_glitches = if snapshot.reset_epoch == self.epoch_reported {
            snapshot.glitch_count.wrapping_sub(self.glitches_reported)
        } else {
            snapshot.glitch_count
        };

        let mut latched = FaultFlags::empty();
        latched.set(FaultFlags::ENCODER_GLITCH, new_glitches != 0);
        latched.set(
            FaultFlags::FRAME_ERROR,
            self.frame_errors != self.errors_reported,
        );
        self.glitches_reported = snapshot.glitch_count;
        self.epoch_reported = snapshot.reset_epoch;
        self.errors_reported = self.frame_errors;

        let frame = TelemetryFrame::from_snapshot(&snapshot, latched).encode();
        tx.send(frame.as_bytes());
    }

    fn dispatch<T: FrameSink>(&mut self, cmd: Command, shared: &SharedState, tx: &mut T) {
        match cmd {
            Command::SetSetpoint { mode, target } => {
                let now = shared.now();
                let version = shared
                    .setpoint()
                    .store(ControlSetpoint::new(mode, target, now));
                log_trace!("setpoint v{} mode {:?} at tick {}", version, mode, now);
            }
            Command::RequestTelemetry => self.emit_telemetry(shared, tx),
            Command::Reset => {
                shared
                    .setpoint()
                    .store(ControlSetpoint::new(Mode::Disabled, Fx::ZERO, shared.now()));
                shared.set_servo(None);
                shared.request_reset();
                self.parser.reset();
                self.frame_errors = 0;
                self.errors_reported = 0;
                log_info!("reset requested");
            }
            Command::SetServo { position } => shared.set_servo(Some(position)),
            Command::ZeroEncoder => {
                shared.request_zero();
                log_debug!("encoder zero requested");
            }
        }
    }

    fn record_error(&mut self, e: FrameError) {
        self.frame_errors = self.frame_errors.saturating_add(1);
        log_debug!("frame dropped: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::shared::StateSnapshot;
    use crate::protocol::messages::{MSG_TELEMETRY, SYNC};

    type Tx = heapless::Vec<u8, 64>;

    fn send(link: &mut CommandLink, shared: &SharedState, tx: &mut Tx, cmd: Command) {
        for &b in cmd.encode().as_bytes() {
            link.on_byte(b, shared, tx);
        }
    }

    fn telemetry(tx: &Tx) -> TelemetryFrame {
        assert_eq!(&tx[..3], &[SYNC, MSG_TELEMETRY, 15]);
        TelemetryFrame::decode(&tx[3..18]).unwrap()
    }

    #[test]
    fn setpoint_is_stamped_with_current_tick() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        shared.set_now(42);

        send(
            &mut link,
            &shared,
            &mut tx,
            Command::SetSetpoint {
                mode: Mode::PositionHold,
                target: Fx::from_num(1000),
            },
        );

        let v = shared.setpoint().load();
        assert_eq!(v.version, 1);
        assert_eq!(v.setpoint.mode, Mode::PositionHold);
        assert_eq!(v.setpoint.target, Fx::from_num(1000));
        assert_eq!(v.setpoint.updated_at, 42);
        assert!(tx.is_empty());
    }

    #[test]
    fn request_telemetry_replies_with_snapshot() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        shared.publish(StateSnapshot {
            position: 1234,
            setpoint_echo: Fx::from_num(7),
            flags: FaultFlags::empty(),
            ..StateSnapshot::INITIAL
        });

        send(&mut link, &shared, &mut tx, Command::RequestTelemetry);

        assert_eq!(tx.len(), 19);
        let t = telemetry(&tx);
        assert_eq!(t.position, 1234);
        assert_eq!(t.setpoint_echo, Fx::from_num(7));
        assert!(t.fault_flags.is_empty());
    }

    #[test]
    fn frame_error_is_latched_until_reported() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            ..StateSnapshot::INITIAL
        });

        // Corrupt checksum.
        for b in [SYNC, 0x03, 0x00, 0x00] {
            link.on_byte(b, &shared, &mut tx);
        }
        assert_eq!(link.frame_errors(), 1);

        link.emit_telemetry(&shared, &mut tx);
        assert!(telemetry(&tx).fault_flags.contains(FaultFlags::FRAME_ERROR));

        tx.clear();
        link.emit_telemetry(&shared, &mut tx);
        assert!(!telemetry(&tx).fault_flags.contains(FaultFlags::FRAME_ERROR));
    }

    #[test]
    fn glitch_flag_follows_glitch_count() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            glitch_count: 2,
            ..StateSnapshot::INITIAL
        });

        link.emit_telemetry(&shared, &mut tx);
        assert!(telemetry(&tx).fault_flags.contains(FaultFlags::ENCODER_GLITCH));
        tx.clear();
        link.emit_telemetry(&shared, &mut tx);
        assert!(!telemetry(&tx).fault_flags.contains(FaultFlags::ENCODER_GLITCH));
    }

    #[test]
    fn reset_disables_and_requests_reset() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        send(
            &mut link,
            &shared,
            &mut tx,
            Command::SetServo {
                position: Fx::from_num(0.5),
            },
        );
        assert_eq!(shared.servo(), Some(Fx::from_num(0.5)));

        send(&mut link, &shared, &mut tx, Command::Reset);
        assert!(shared.take_reset_request());
        assert_eq!(shared.setpoint().load().setpoint.mode, Mode::Disabled);
        assert_eq!(shared.servo(), None);
    }

    #[test]
    fn telemetry_during_pending_reset_shows_cleared_state() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        let faulted = StateSnapshot {
            flags: FaultFlags::FAULTED.union(FaultFlags::GLITCH_BURST),
            glitch_count: 5,
            ..StateSnapshot::INITIAL
        };
        shared.publish(faulted);

        link.emit_telemetry(&shared, &mut tx);
        assert_eq!(telemetry(&tx).fault_flags.bits(), 0x29);

        send(&mut link, &shared, &mut tx, Command::Reset);
        tx.clear();
        send(&mut link, &shared, &mut tx, Command::RequestTelemetry);
        assert!(telemetry(&tx).fault_flags.is_empty());

        // The tick applies the reset: new epoch, glitch count back to zero.
        assert!(shared.take_reset_request());
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            glitch_count: 0,
            reset_epoch: 1,
            ..faulted
        });
        tx.clear();
        link.emit_telemetry(&shared, &mut tx);
        assert!(telemetry(&tx).fault_flags.is_empty());

        // A real glitch in the new epoch is still reported.
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            glitch_count: 1,
            reset_epoch: 1,
            ..faulted
        });
        tx.clear();
        link.emit_telemetry(&shared, &mut tx);
        assert_eq!(telemetry(&tx).fault_flags, FaultFlags::ENCODER_GLITCH);
    }

    #[test]
    fn glitches_across_an_unreported_reset_are_flagged() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            glitch_count: 3,
            ..StateSnapshot::INITIAL
        });
        link.emit_telemetry(&shared, &mut tx);

        // Reset applied by the tick, then three fresh glitches before the next report.
        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            glitch_count: 3,
            reset_epoch: 1,
            ..StateSnapshot::INITIAL
        });
        tx.clear();
        link.emit_telemetry(&shared, &mut tx);
        assert!(telemetry(&tx).fault_flags.contains(FaultFlags::ENCODER_GLITCH));
    }

    #[test]
    fn line_errors_count_as_frame_errors() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        link.on_line_errors(0);
        assert_eq!(link.frame_errors(), 0);
        link.on_line_errors(2);
        assert_eq!(link.frame_errors(), 2);
        link.on_line_errors(u32::MAX);
        assert_eq!(link.frame_errors(), u16::MAX);

        shared.publish(StateSnapshot {
            flags: FaultFlags::empty(),
            ..StateSnapshot::INITIAL
        });
        link.emit_telemetry(&shared, &mut tx);
        assert!(telemetry(&tx).fault_flags.contains(FaultFlags::FRAME_ERROR));
    }

    #[test]
    fn zero_encoder_sets_request() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        send(&mut link, &shared, &mut tx, Command::ZeroEncoder);
        assert!(shared.take_zero_request());
    }

    #[test]
    fn poll_emits_only_when_due() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx = Tx::new();
        link.poll(&shared, &mut tx);
        assert!(tx.is_empty());
        shared.request_telemetry();
        link.poll(&shared, &mut tx);
        assert_eq!(tx.len(), 19);
    }

    #[test]
    fn full_sink_drops_whole_frame() {
        let shared = SharedState::new();
        let mut link = CommandLink::new();
        let mut tx: heapless::Vec<u8, 8> = heapless::Vec::new();
        link.emit_telemetry(&shared, &mut tx);
        assert!(tx.is_empty());
    }
}
