//! Peripheral drivers.

pub mod ds3231;
