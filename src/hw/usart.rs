// SPDX-License-Identifier: MIT

//! Debug console over USART.
//!
//! Thin TX-only wrapper for reporting readings to an attached terminal. Supports `write!` /
//! `writeln!` through `core::fmt::Write`.
//!
//! Serial terminals want CRLF line endings. [`Console::println`] appends them; format strings
//! handed to `writeln!` need their own trailing `\r`.
//!
//! The board's ST-LINK bridges USART3 to USB, so the reading stream turns up host-side as a
//! serial device:
//!
//! ```sh
//! $ screen /dev/ttyACM0 115200
//! ```
//!
//! Detach with `Ctrl+A` then `k`.

use core::fmt;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

pub struct Console<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Console<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

// `fmt::Write` routes formatted output through the blocking byte writer.
impl<U: Instance> fmt::Write for Console<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Console::write_str(self, s);
        Ok(())
    }
}
