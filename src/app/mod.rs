//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the per-wake cycle of the logger: schedule check,
//! sampling, logging and upload.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
