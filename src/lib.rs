// SPDX-License-Identifier: MIT

//! # Sonarbot Firmware
//!
//! Firmware library for an ultrasonic ranging node built around an HC-SR04 class sensor on an
//! STM32F767ZI Nucleo board.
//!
//! | Module    | Purpose                                                              |
//! |-----------|----------------------------------------------------------------------|
//! | `hw`      | Timer tick source, echo edge capture, pins, LED, and debug console   |
//! | `drivers` | Ultrasonic distance driver: trigger, echo timing, unit conversion    |
//! | `control` | Ranging loop that polls the driver and classifies readings           |
//!
//! ## Getting started
//!
//! The core logic is hardware-independent and tests on the host:
//!
//! ```sh
//! cargo test
//! ```
//!
//! The firmware binary needs the device support compiled in:
//!
//! ```sh
//! cargo build --release --features stm32f7 --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! MIT. See `LICENSE`.

#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod drivers;
pub mod hw;

#[cfg(test)]
pub(crate) mod testutil;
