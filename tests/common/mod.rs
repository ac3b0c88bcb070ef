// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared fixtures for the integration tests: a scheduler on simulated devices and a command
//! link feeding it, wired through one `SharedState` the way the firmware wires them.

#![allow(dead_code)]

use motorloop::control::ControlScheduler;
use motorloop::drivers::sim::{SimEncoder, SimMotor, SimServo};
use motorloop::protocol::{Command, CommandLink, TelemetryFrame};
use motorloop::{ControlConfig, SharedState};

/// Compare value at 100 % duty for the simulated bridge.
pub const MOTOR_MAX_DUTY: u16 = 1_000;
/// Compare value spanning one 20 ms servo frame.
pub const SERVO_MAX_DUTY: u16 = 64_000;

pub type Scheduler = ControlScheduler<SimEncoder<16>, SimMotor, SimServo>;
pub type Tx = heapless::Vec<u8, 256>;

pub struct Rig {
    pub shared: SharedState,
    pub scheduler: Scheduler,
    pub link: CommandLink,
    pub tx: Tx,
}

impl Rig {
    /// A started scheduler built from `config`.
    pub fn new(config: ControlConfig) -> Self {
        let mut scheduler = ControlScheduler::new(
            &config,
            SimEncoder::new(0),
            SimMotor::new(MOTOR_MAX_DUTY),
            SimServo::new(SERVO_MAX_DUTY),
        )
        .expect("valid config");
        scheduler.start();
        Self {
            shared: SharedState::new(),
            scheduler,
            link: CommandLink::new(),
            tx: Tx::new(),
        }
    }

    /// Deliver `cmd` over the link byte by byte.
    pub fn send(&mut self, cmd: Command) {
        for &b in cmd.encode().as_bytes() {
            self.link.on_byte(b, &self.shared, &mut self.tx);
        }
    }

    pub fn tick(&mut self) -> motorloop::control::TickReport {
        self.scheduler.on_tick(&self.shared)
    }

    pub fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Request telemetry and decode the reply.
    pub fn telemetry(&mut self) -> TelemetryFrame {
        self.tx.clear();
        self.send(Command::RequestTelemetry);
        assert_eq!(self.tx.len(), 19, "one telemetry frame expected");
        TelemetryFrame::decode(&self.tx[3..18]).expect("telemetry payload")
    }
}
