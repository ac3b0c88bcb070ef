// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Firmware entry point.
//!
//! Two interrupt contexts share one [`SharedState`]:
//!
//! - TIM6 (higher priority) runs one control tick per update event;
//! - USART1 (lower priority) parses commands and drains telemetry.
//!
//! The main loop only sleeps.

#![no_main]
#![no_std]

use core::cell::RefCell;

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use critical_section::Mutex;
use panic_halt as _;

#[cfg(feature = "defmt")]
use defmt_rtt as _;

use hal::{
    pac::{self, interrupt, Interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use motorloop::config::{COMMAND_BAUD, TICK_HZ};
use motorloop::hw::{BoardPins, CommandPort, Encoder, Led, MotorPwm, ServoPwm, TickTimer};
use motorloop::{CommandLink, ControlConfig, ControlScheduler, SchedulerState, SharedState};

type Scheduler = ControlScheduler<Encoder<pac::TIM3>, MotorPwm, ServoPwm>;

/// Everything owned by the control tick.
struct Control {
    scheduler: Scheduler,
    timer: TickTimer,
    fault_led: Led<'D', 8>,
    run_led: Led<'D', 10>,
}

/// Everything owned by the serial handler.
struct Link {
    port: CommandPort<pac::USART1>,
    link: CommandLink,
}

static SHARED: SharedState = SharedState::new();

// Handed from `main` to the interrupt handlers once, before they are unmasked.
static CONTROL_INIT: Mutex<RefCell<Option<Control>>> = Mutex::new(RefCell::new(None));
static LINK_INIT: Mutex<RefCell<Option<Link>>> = Mutex::new(RefCell::new(None));

// Lower value is more urgent; the tick must preempt the serial handler.
const TICK_PRIORITY: u8 = 0x20;
const SERIAL_PRIORITY: u8 = 0x40;

#[entry]
fn main() -> ! {
    // Peripherals
    let Some(dp) = pac::Peripherals::take() else {
        halt()
    };
    let Some(mut cp) = cortex_m::Peripherals::take() else {
        halt()
    };

    // Clocks: HSI, timers at TIMER_CLOCK_HZ
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let BoardPins {
        leds,
        usart1,
        encoder: _encoder_pins,
        motor,
        servo: _servo_pins,
    } = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);

    let mut fault_led = Led::active_low(leds.red);
    let run_led = Led::active_low(leds.green);

    // USART1 (command link)
    let usart_cfg = Config {
        baud_rate: COMMAND_BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (usart1.tx, usart1.rx), &clocks, usart_cfg);
    let port = CommandPort::new(serial);

    // Encoder, drive PWM, servo PWM
    let encoder = Encoder::tim3(dp.TIM3);
    let motor_pwm = MotorPwm::tim4(dp.TIM4, motor.dir);
    let servo_pwm = ServoPwm::tim12(dp.TIM12);

    let config = ControlConfig::default();
    let mut scheduler = match Scheduler::new(&config, encoder, motor_pwm, servo_pwm) {
        Ok(s) => s,
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::error!("invalid configuration: {:?}", _e);
            fault_led.set(true);
            halt()
        }
    };
    scheduler.start();

    let mut timer = TickTimer::tim6(dp.TIM6, TICK_HZ);
    timer.start();

    critical_section::with(|cs| {
        CONTROL_INIT.borrow_ref_mut(cs).replace(Control {
            scheduler,
            timer,
            fault_led,
            run_led,
        });
        LINK_INIT.borrow_ref_mut(cs).replace(Link {
            port,
            link: CommandLink::new(),
        });
    });

    #[cfg(feature = "defmt")]
    defmt::info!("motorloop: control tick at {} Hz", TICK_HZ);

    unsafe {
        cp.NVIC.set_priority(Interrupt::TIM6_DAC, TICK_PRIORITY);
        cp.NVIC.set_priority(Interrupt::USART1, SERIAL_PRIORITY);
        NVIC::unmask(Interrupt::TIM6_DAC);
        NVIC::unmask(Interrupt::USART1);
    }

    loop {
        cortex_m::asm::wfi();
    }
}

fn halt() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

#[interrupt]
fn TIM6_DAC() {
    static mut CONTROL: Option<Control> = None;

    if CONTROL.is_none() {
        *CONTROL = critical_section::with(|cs| CONTROL_INIT.borrow_ref_mut(cs).take());
    }
    let Some(control) = CONTROL.as_mut() else {
        return;
    };

    control.timer.clear_interrupt();
    let report = control.scheduler.on_tick(&SHARED);

    control
        .fault_led
        .set(matches!(report.state, SchedulerState::Faulted(_)));
    control
        .run_led
        .set(report.state == SchedulerState::Running);

    if report.telemetry_due {
        NVIC::pend(Interrupt::USART1);
    }
}

#[interrupt]
fn USART1() {
    static mut LINK: Option<Link> = None;

    if LINK.is_none() {
        *LINK = critical_section::with(|cs| LINK_INIT.borrow_ref_mut(cs).take());
    }
    let Some(Link { port, link }) = LINK.as_mut() else {
        return;
    };

    while let Some(byte) = port.read_byte() {
        link.on_byte(byte, &SHARED, port);
    }
    link.on_line_errors(port.take_rx_errors());
    link.poll(&SHARED, port);
    port.drain();
}
