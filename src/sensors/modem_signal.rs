//! Modem signal strength as two log columns.
//!
//! The modem is only powered after the record is on the medium, so these
//! columns carry the reading taken while attached on the previous tick.
//! Before the first attach, and after a failed one, they log as missing.

use core::cell::Cell;
use std::rc::Rc;

use crate::app::ports::Sensor;
use crate::modem::signal::SignalQuality;

/// Last signal reading, written by the orchestrator after each attach.
#[derive(Clone, Default)]
pub struct SignalStore(Rc<Cell<Option<SignalQuality>>>);

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, quality: SignalQuality) {
        self.0.set(Some(quality));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }

    pub fn latest(&self) -> Option<SignalQuality> {
        self.0.get()
    }
}

/// Received signal strength, dBm.
pub struct ModemRssi {
    store: SignalStore,
}

impl ModemRssi {
    pub fn new(store: SignalStore) -> Self {
        Self { store }
    }
}

impl Sensor for ModemRssi {
    fn name(&self) -> &str {
        "Modem"
    }

    fn variable_name(&self) -> &str {
        "RSSI"
    }

    fn unit(&self) -> &str {
        "decibelMiliWatt"
    }

    fn value(&mut self) -> f32 {
        self.store.latest().map_or(f32::NAN, |q| q.rssi as f32)
    }

    fn decimals(&self) -> usize {
        0
    }
}

/// Signal strength as a percentage of the modem's range.
pub struct ModemSignalPercent {
    store: SignalStore,
}

impl ModemSignalPercent {
    pub fn new(store: SignalStore) -> Self {
        Self { store }
    }
}

impl Sensor for ModemSignalPercent {
    fn name(&self) -> &str {
        "Modem"
    }

    fn variable_name(&self) -> &str {
        "signalPercent"
    }

    fn unit(&self) -> &str {
        "percent"
    }

    fn value(&mut self) -> f32 {
        self.store.latest().map_or(f32::NAN, |q| f32::from(q.percent))
    }

    fn decimals(&self) -> usize {
        0
    }
}
