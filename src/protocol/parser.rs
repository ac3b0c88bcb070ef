// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time frame parser.
//!
//! The parser validates the frame envelope (known id, matching length, checksum) and hands out
//! [`RawFrame`]s; interpreting the payload is up to the caller. It is fed from the serial receive
//! interrupt and never blocks or allocates.
//!
//! Any malformed frame is reported once and dropped, and parsing resumes with the next SYNC. A
//! SYNC byte arriving where an id or length is expected restarts the frame, so a frame whose SYNC
//! was corrupted cannot swallow the one that follows it.

use crate::error::FrameError;
use crate::protocol::messages::{payload_len, MAX_PAYLOAD, SYNC};

/// A frame whose envelope checked out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub id: u8,
    len: u8,
    payload: [u8; MAX_PAYLOAD],
}

impl RawFrame {
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..usize::from(self.len)]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    WaitStart,
    WaitId,
    WaitLength { id: u8 },
    Payload { id: u8, len: u8, idx: u8 },
    WaitChecksum { id: u8, len: u8 },
}

pub struct Parser {
    state: State,
    checksum: u8,
    payload: [u8; MAX_PAYLOAD],
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub const fn new() -> Self {
        Self {
            state: State::WaitStart,
            checksum: 0,
            payload: [0; MAX_PAYLOAD],
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = State::WaitStart;
        self.checksum = 0;
    }

    /// True while no frame is in progress.
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitStart
    }

    fn restart(&mut self) {
        self.state = State::WaitId;
        self.checksum = SYNC;
    }

    /// Process a single incoming byte.
    ///
    /// Returns `Some(Ok(frame))` when a valid frame completes, `Some(Err(_))` when a frame is
    /// discarded, and `None` otherwise.
    pub fn push(&mut self, byte: u8) -> Option<Result<RawFrame, FrameError>> {
        match self.state {
            State::WaitStart => {
                if byte == SYNC {
                    self.restart();
                }
                None
            }
            State::WaitId => {
                if byte == SYNC {
                    self.restart();
                    return None;
                }
                match payload_len(byte) {
                    Some(_) => {
                        self.checksum = self.checksum.wrapping_add(byte);
                        self.state = State::WaitLength { id: byte };
                        None
                    }
                    None => {
                        // Unknown message ID, reset state
                        self.reset();
                        Some(Err(FrameError::UnknownCommand(byte)))
                    }
                }
            }
            State::WaitLength { id } => {
                let expected = payload_len(id).unwrap_or(0);
                if byte != expected {
                    if byte == SYNC {
                        self.restart();
                    } else {
                        self.reset();
                    }
                    return Some(Err(FrameError::LengthMismatch {
                        id,
                        expected,
                        found: byte,
                    }));
                }
                self.checksum = self.checksum.wrapping_add(byte);
                self.state = if byte == 0 {
                    State::WaitChecksum { id, len: 0 }
                } else {
                    State::Payload {
                        id,
                        len: byte,
                        idx: 0,
                    }
                };
                None
            }
            State::Payload { id, len, idx } => {
                self.payload[usize::from(idx)] = byte;
                self.checksum = self.checksum.wrapping_add(byte);
                let idx = idx + 1;
                self.state = if idx == len {
                    State::WaitChecksum { id, len }
                } else {
                    State::Payload { id, len, idx }
                };
                None
            }
            State::WaitChecksum { id, len } => {
                // Verify checksum
                let expected = self.checksum;
                self.reset(); // Reset for next message

                if byte != expected {
                    return Some(Err(FrameError::Checksum {
                        expected,
                        found: byte,
                    }));
                }
                Some(Ok(RawFrame {
                    id,
                    len,
                    payload: self.payload,
                }))
            }
        }
    }
}
