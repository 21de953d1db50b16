// SPDX-License-Identifier: MIT

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! application logic.
//!
//! ## Existing drivers
//!
//! - [`hcsr04`] – HC-SR04 ultrasonic rangefinder with blocking and staged measurement paths

pub mod hcsr04;

pub use hcsr04::{
    is_valid_distance, speed_of_sound_m_per_s, Environment, FixedEnvironment, HcSr04, Stage,
    ECHO_TIMEOUT_TICKS, NO_ECHO_DISTANCE_M, TRIGGER_PULSE_TICKS,
};
