// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-driven command UART.
//!
//! Received bytes are read in the USART interrupt and handed straight to the command link.
//! Outgoing frames are queued whole and drained from the same interrupt using TXE, so the control
//! tick never waits on the serial line.
//!
//! To watch the raw link from the host, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```

use heapless::Deque;

use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{Event, Instance, Pins, Rx, Serial, Tx},
};

use crate::protocol::FrameSink;

/// Outgoing queue depth: several telemetry frames.
pub const TX_QUEUE: usize = 128;

pub struct CommandPort<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
    queue: Deque<u8, TX_QUEUE>,
    rx_errors: u32,
}

impl CommandPort<pac::USART1> {
    pub fn new<PINS: Pins<pac::USART1>>(mut serial: Serial<pac::USART1, PINS>) -> Self {
        serial.listen(Event::Rxne);
        let (tx, rx) = serial.split();
        Self {
            tx,
            rx,
            queue: Deque::new(),
            rx_errors: 0,
        }
    }

    #[inline]
    fn set_txe_interrupt(&mut self, on: bool) {
        let usart = unsafe { &*pac::USART1::ptr() };
        usart.cr1.modify(|_, w| w.txeie().bit(on));
    }

    /// Pop the next received byte, if any.
    pub fn read_byte(&mut self) -> Option<u8> {
        loop {
            match self.rx.read() {
                Ok(b) => return Some(b),
                Err(nb::Error::WouldBlock) => return None,
                // Framing/noise/overrun: the byte is lost, the parser resyncs on its own
                Err(nb::Error::Other(_)) => {
                    self.rx_errors = self.rx_errors.wrapping_add(1);
                }
            }
        }
    }

    /// Move queued bytes into the transmit register until it is busy or the queue is empty.
    pub fn drain(&mut self) {
        while let Some(&b) = self.queue.front() {
            match self.tx.write(b) {
                Ok(()) => {
                    self.queue.pop_front();
                }
                Err(_) => break,
            }
        }
        let pending = !self.queue.is_empty();
        self.set_txe_interrupt(pending);
    }

    /// Line errors seen since the last call.
    #[inline]
    pub fn take_rx_errors(&mut self) -> u32 {
        core::mem::take(&mut self.rx_errors)
    }
}

impl FrameSink for CommandPort<pac::USART1> {
    fn send(&mut self, bytes: &[u8]) {
        if self.queue.capacity() - self.queue.len() < bytes.len() {
            log_warn!("tx queue full, dropping {} byte frame", bytes.len());
            return;
        }
        for &b in bytes {
            // Capacity checked above.
            let _ = self.queue.push_back(b);
        }
        self.set_txe_interrupt(true);
    }
}
