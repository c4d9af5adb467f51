//! FieldLogger firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod datalog;
pub mod error;
pub mod fsm;
pub mod modem;
pub mod pins;
pub mod power;
pub mod scheduler;
pub mod upload;

// Hardware-facing code.  ESP-IDF parts are cfg-gated inside each module.
pub mod adapters;
pub mod drivers;
pub mod sensors;
