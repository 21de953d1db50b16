// SPDX-License-Identifier: MIT

//! # Control Loop Building Blocks
//!
//! This module provides the application-level loop logic layered on the drivers.
//!
//! ## Modules
//!
//! - [`ranging`] - Polling controller that owns the rangefinder's measurement cycle.

pub mod ranging;

pub use ranging::{Ranger, Reading};
