// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! End-to-end scenarios: frames in over the link, ticks on simulated hardware, telemetry out.

mod common;

use common::Rig;
use motorloop::config::{DriveConfig, EncoderConfig, PidGains, SchedulerConfig};
use motorloop::control::{FaultCause, FaultFlags, Mode, SchedulerState};
use motorloop::drivers::Direction;
use motorloop::error::HwError;
use motorloop::protocol::Command;
use motorloop::units::{Fx, Wide};
use motorloop::ControlConfig;

#[test]
fn position_hold_first_tick_is_slew_limited() {
    let max_slew = Fx::ONE / 10;
    let config = ControlConfig::default()
        .with_gains(PidGains::new(Wide::ONE / 2_000, Wide::ZERO, Wide::ZERO))
        .with_drive(DriveConfig::default().with_max_slew(max_slew));
    let mut rig = Rig::new(config);

    rig.send(Command::SetSetpoint {
        mode: Mode::PositionHold,
        target: Fx::from_num(1000),
    });
    let report = rig.tick();

    // Raw PID output is 1000 * Kp = 0.5 ...
    assert_eq!(report.state, SchedulerState::Running);
    assert!((report.command.duty - Fx::from_num(0.5)).abs() < Fx::ONE / 1_000);
    // ... but only one slew step reaches the bridge.
    assert_eq!(rig.scheduler.motor().applied_duty(), max_slew);
    assert_eq!(rig.scheduler.motor().direction(), Direction::Forward);
    assert!(rig.scheduler.motor().compare() > 0);

    let t = rig.telemetry();
    assert_eq!(t.setpoint_echo, Fx::from_num(1000));
    assert_eq!(t.position, 0);
    assert!(t.fault_flags.is_empty());
    // Q2.14 on the wire: within one LSB.
    assert!((t.actuator_duty - max_slew).abs() <= Fx::ONE / 0x4000);
}

#[test]
fn silent_link_degrades_to_zero_duty() {
    let timeout = 20;
    let config = ControlConfig::default()
        .with_drive(DriveConfig::default().with_max_slew(Fx::ONE))
        .with_scheduler(SchedulerConfig::default().with_stale_timeout(timeout));
    let mut rig = Rig::new(config);

    rig.send(Command::SetSetpoint {
        mode: Mode::OpenLoopDuty,
        target: Fx::from_num(0.75),
    });
    rig.ticks(timeout);
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::from_num(0.75));
    assert!(rig.scheduler.motor().output().compare() > 0);

    // One tick past the timeout.
    let report = rig.tick();
    assert!(!report.command.enabled);
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::ZERO);
    assert_eq!(rig.scheduler.motor().output().compare(), 0);
    assert_eq!(rig.scheduler.controller().mode(), Mode::Disabled);
    assert_eq!(report.state, SchedulerState::Running);

    let t = rig.telemetry();
    assert!(t.fault_flags.contains(FaultFlags::SETPOINT_STALE));
    assert_eq!(t.actuator_duty, Fx::ZERO);

    // A fresh setpoint resumes control.
    rig.send(Command::SetSetpoint {
        mode: Mode::OpenLoopDuty,
        target: Fx::from_num(0.25),
    });
    rig.tick();
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::from_num(0.25));
    assert!(!rig.telemetry().fault_flags.contains(FaultFlags::SETPOINT_STALE));
}

#[test]
fn glitch_burst_faults_until_reset() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.send(Command::SetSetpoint {
        mode: Mode::OpenLoopDuty,
        target: Fx::from_num(0.5),
    });
    rig.ticks(3);
    assert!(rig.scheduler.motor().applied_duty() > Fx::ZERO);

    let mut state = rig.tick().state;
    assert_eq!(state, SchedulerState::Running);
    for _ in 0..5 {
        rig.scheduler.estimator_mut().counter_mut().advance(10_000);
        state = rig.tick().state;
    }
    assert_eq!(state, SchedulerState::Faulted(FaultCause::GlitchBurst));
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::ZERO);
    assert_eq!(rig.scheduler.motor().output().compare(), 0);

    let t = rig.telemetry();
    assert!(t.fault_flags.contains(FaultFlags::FAULTED));
    assert!(t.fault_flags.contains(FaultFlags::GLITCH_BURST));
    assert!(t.fault_flags.contains(FaultFlags::ENCODER_GLITCH));
    assert_eq!(t.actuator_duty, Fx::ZERO);

    // Setpoints are ignored while Faulted.
    rig.send(Command::SetSetpoint {
        mode: Mode::OpenLoopDuty,
        target: Fx::from_num(0.5),
    });
    assert!(matches!(rig.tick().state, SchedulerState::Faulted(_)));
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::ZERO);

    rig.send(Command::Reset);
    assert_eq!(rig.tick().state, SchedulerState::Running);

    let t = rig.telemetry();
    assert!(t.fault_flags.is_empty(), "flags {:#04x}", t.fault_flags.bits());
    // Reset leaves the controller disabled until the next setpoint.
    assert_eq!(rig.scheduler.controller().mode(), Mode::Disabled);
    assert_eq!(rig.scheduler.motor().applied_duty(), Fx::ZERO);
}

#[test]
fn zero_encoder_rebases_position() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.scheduler.estimator_mut().counter_mut().advance(150);
    rig.tick();
    assert_eq!(rig.telemetry().position, 150);

    rig.send(Command::ZeroEncoder);
    rig.tick();
    assert_eq!(rig.telemetry().position, 0);

    rig.scheduler.estimator_mut().counter_mut().advance(-40);
    rig.tick();
    assert_eq!(rig.telemetry().position, -40);
}

#[test]
fn servo_follows_link_and_releases_on_reset() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.send(Command::SetServo { position: Fx::ZERO });
    rig.tick();
    // 1500 us of a 20 ms frame.
    assert_eq!(
        rig.scheduler.servo().output().compare(),
        (1_500u32 * u32::from(common::SERVO_MAX_DUTY) / 20_000) as u16
    );

    rig.send(Command::Reset);
    rig.tick();
    assert_eq!(rig.scheduler.servo().position(), None);
    assert_eq!(rig.scheduler.servo().output().compare(), 0);
}

#[test]
fn periodic_telemetry_is_flagged_by_the_tick() {
    let interval = 5;
    let config = ControlConfig::default()
        .with_scheduler(SchedulerConfig::default().with_telemetry_interval(interval));
    let mut rig = Rig::new(config);

    let mut due = 0;
    for _ in 0..(interval * 4) {
        if rig.tick().telemetry_due {
            due += 1;
            rig.link.poll(&rig.shared, &mut rig.tx);
        }
    }
    assert_eq!(due, 4);
    assert_eq!(rig.tx.len(), 4 * 19);
}

#[test]
fn malformed_frames_are_counted_and_flagged_once() {
    let mut rig = Rig::new(ControlConfig::default());
    for b in [0xA5, 0x01, 0x05, 0x07, 0, 0, 0, 0, 0xB2] {
        rig.link.on_byte(b, &rig.shared, &mut rig.tx);
    }
    assert_eq!(rig.link.frame_errors(), 1);
    rig.tick();
    assert!(rig.telemetry().fault_flags.contains(FaultFlags::FRAME_ERROR));
    assert!(!rig.telemetry().fault_flags.contains(FaultFlags::FRAME_ERROR));
}

#[test]
fn velocity_reported_at_the_plausible_step() {
    let max_step = 200;
    let config = ControlConfig::default()
        .with_encoder(EncoderConfig::default().with_max_step(max_step).with_smoothing(Fx::ONE));
    let mut rig = Rig::new(config);

    for _ in 0..3 {
        rig.scheduler.estimator_mut().counter_mut().advance(max_step as i32);
        assert!(!rig.tick().encoder.glitch);
    }
    let t = rig.telemetry();
    assert_eq!(t.velocity, Fx::from_num(max_step));
    assert_eq!(t.position, 3 * max_step as i32);
    assert!(t.fault_flags.is_empty());
}

#[test]
fn velocity_hold_tracks_a_fast_target() {
    let config = ControlConfig::default()
        .with_gains(PidGains::new(Wide::ONE / 100, Wide::ZERO, Wide::ZERO))
        .with_encoder(EncoderConfig::default().with_smoothing(Fx::ONE));
    let mut rig = Rig::new(config);
    rig.send(Command::SetSetpoint {
        mode: Mode::VelocityHold,
        target: Fx::from_num(150),
    });

    // Shaft already faster than the target: the controller pushes back.
    rig.scheduler.estimator_mut().counter_mut().advance(180);
    let report = rig.tick();
    assert_eq!(report.encoder.velocity, Fx::from_num(180));
    assert!(report.command.duty.is_negative());
}

#[test]
fn position_survives_a_fault() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.send(Command::SetSetpoint {
        mode: Mode::OpenLoopDuty,
        target: Fx::from_num(0.5),
    });
    rig.tick();
    rig.scheduler
        .motor_mut()
        .output_mut()
        .fail_next_write(HwError::PwmWrite);
    assert_eq!(
        rig.tick().state,
        SchedulerState::Faulted(FaultCause::Actuator(HwError::PwmWrite))
    );

    for _ in 0..2 {
        rig.scheduler.estimator_mut().counter_mut().advance(150);
        rig.tick();
    }
    assert_eq!(rig.telemetry().position, 300);

    rig.send(Command::Reset);
    let report = rig.tick();
    assert_eq!(report.state, SchedulerState::Running);
    assert!(!report.encoder.glitch);

    let t = rig.telemetry();
    assert_eq!(t.position, 300);
    assert!(t.fault_flags.is_empty(), "flags {:#04x}", t.fault_flags.bits());
}

#[test]
fn reset_is_visible_before_the_next_tick() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.tick();
    for _ in 0..5 {
        rig.scheduler.estimator_mut().counter_mut().advance(10_000);
        rig.tick();
    }
    assert_eq!(rig.telemetry().fault_flags.bits(), 0x29);

    rig.send(Command::Reset);
    let t = rig.telemetry();
    assert!(t.fault_flags.is_empty(), "flags {:#04x}", t.fault_flags.bits());

    rig.tick();
    let t = rig.telemetry();
    assert!(t.fault_flags.is_empty(), "flags {:#04x}", t.fault_flags.bits());
    rig.tick();
    assert!(rig.telemetry().fault_flags.is_empty());

    // Glitches after the reset are reported again.
    rig.scheduler.estimator_mut().counter_mut().advance(10_000);
    rig.tick();
    assert_eq!(rig.telemetry().fault_flags, FaultFlags::ENCODER_GLITCH);
}
