// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! State crossing the control-tick / serial-receive boundary.
//!
//! The control tick and the serial handler run in different interrupt contexts. Everything they
//! share lives in one [`SharedState`], normally a `static`:
//!
//! - the [`ControlSetpoint`], versioned and copied whole inside a critical section, so a reader
//!   sees either the old or the new mode/target/timestamp, never a mix;
//! - the [`StateSnapshot`] published at the end of every tick, read whole for telemetry;
//! - single-word atomics for the tick counter and the one-shot requests.
//!
//! Critical sections only cover a copy of a few words.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::Mutex;

use crate::control::fault::FaultFlags;
use crate::control::setpoint::ControlSetpoint;
use crate::units::{from_wire_duty, to_wire_duty, Fx, WireDuty};

/// A setpoint together with the number of writes that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub version: u32,
    pub setpoint: ControlSetpoint,
}

/// Single-writer, single-reader setpoint handoff.
pub struct SetpointCell {
    inner: Mutex<Cell<Versioned>>,
}

impl SetpointCell {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Versioned {
                version: 0,
                setpoint: ControlSetpoint::DISABLED,
            })),
        }
    }

    /// Replace the setpoint. Returns the new version.
    pub fn store(&self, setpoint: ControlSetpoint) -> u32 {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let next = Versioned {
                version: cell.get().version.wrapping_add(1),
                setpoint,
            };
            cell.set(next);
            next.version
        })
    }

    /// Copy out the current setpoint.
    pub fn load(&self) -> Versioned {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }
}

impl Default for SetpointCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent view of the control state at the end of one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    pub tick: u32,
    pub position: i32,
    pub velocity: Fx,
    pub setpoint_echo: Fx,
    pub applied_duty: Fx,
    /// State-derived flags (stale, faulted, idle). Latched flags are added by the link.
    pub flags: FaultFlags,
    /// Total encoder glitches since the last reset.
    pub glitch_count: u32,
    /// Number of resets the tick has applied, wrapping. `glitch_count` restarts on each.
    pub reset_epoch: u32,
}

impl StateSnapshot {
    pub const INITIAL: Self = Self {
        tick: 0,
        position: 0,
        velocity: Fx::ZERO,
        setpoint_echo: Fx::ZERO,
        applied_duty: Fx::ZERO,
        flags: FaultFlags::IDLE,
        glitch_count: 0,
        reset_epoch: 0,
    };

    /// The view the next tick will publish once it applies a pending reset.
    ///
    /// Faults, staleness and the glitch count clear, the setpoint becomes Disabled and the drive
    /// neutral. An Idle scheduler stays Idle.
    pub fn after_reset(&self) -> Self {
        Self {
            setpoint_echo: Fx::ZERO,
            applied_duty: Fx::ZERO,
            flags: self.flags.intersection(FaultFlags::IDLE),
            glitch_count: 0,
            reset_epoch: self.reset_epoch.wrapping_add(1),
            ..*self
        }
    }
}

const SERVO_ENABLED: u32 = 1 << 16;

/// Everything shared between the control tick and the serial handler.
pub struct SharedState {
    setpoint: SetpointCell,
    snapshot: Mutex<Cell<StateSnapshot>>,
    now: AtomicU32,
    reset_requested: AtomicBool,
    zero_requested: AtomicBool,
    telemetry_due: AtomicBool,
    servo: AtomicU32,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            setpoint: SetpointCell::new(),
            snapshot: Mutex::new(Cell::new(StateSnapshot::INITIAL)),
            now: AtomicU32::new(0),
            reset_requested: AtomicBool::new(false),
            zero_requested: AtomicBool::new(false),
            telemetry_due: AtomicBool::new(false),
            servo: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn setpoint(&self) -> &SetpointCell {
        &self.setpoint
    }

    /// Current control tick count, as last published by the tick.
    #[inline]
    pub fn now(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_now(&self, tick: u32) {
        self.now.store(tick, Ordering::Release);
    }

    pub fn publish(&self, snapshot: StateSnapshot) {
        critical_section::with(|cs| self.snapshot.borrow(cs).set(snapshot));
    }

    pub fn snapshot(&self) -> StateSnapshot {
        critical_section::with(|cs| self.snapshot.borrow(cs).get())
    }

    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    /// A reset was requested and the tick has not applied it yet.
    #[inline]
    pub fn reset_pending(&self) -> bool {
        self.reset_requested.load(Ordering::Acquire)
    }

    pub fn take_reset_request(&self) -> bool {
        self.reset_requested.swap(false, Ordering::AcqRel)
    }

    pub fn request_zero(&self) {
        self.zero_requested.store(true, Ordering::Release);
    }

    pub fn take_zero_request(&self) -> bool {
        self.zero_requested.swap(false, Ordering::AcqRel)
    }

    pub fn request_telemetry(&self) {
        self.telemetry_due.store(true, Ordering::Release);
    }

    pub fn take_telemetry_due(&self) -> bool {
        self.telemetry_due.swap(false, Ordering::AcqRel)
    }

    /// Set the servo target in `[-1, 1]`, or `None` to release the servo.
    pub fn set_servo(&self, position: Option<Fx>) {
        let word = match position {
            Some(p) => SERVO_ENABLED | u32::from(to_wire_duty(p).to_bits() as u16),
            None => 0,
        };
        self.servo.store(word, Ordering::Release);
    }

    pub fn servo(&self) -> Option<Fx> {
        let word = self.servo.load(Ordering::Acquire);
        if word & SERVO_ENABLED == 0 {
            return None;
        }
        Some(from_wire_duty(WireDuty::from_bits(word as u16 as i16)))
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
