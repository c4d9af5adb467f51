//! Battery voltage through the board's resistor divider.
//!
//! Older boards (v0.3/v0.4) divide by 1.47, v0.5 and later by 4.7.

use serde::{Deserialize, Serialize};

use crate::app::ports::{AnalogPort, Sensor};

/// ADC reference voltage.
const V_REF: f32 = 3.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardRevision {
    V0_3,
    V0_4,
    V0_5,
}

impl BoardRevision {
    /// Divider ratio between the battery and the ADC pin.
    pub fn divider(self) -> f32 {
        match self {
            Self::V0_3 | Self::V0_4 => 1.47,
            Self::V0_5 => 4.7,
        }
    }
}

pub struct BatteryVoltage<A: AnalogPort> {
    adc: A,
    board: BoardRevision,
}

impl<A: AnalogPort> BatteryVoltage<A> {
    pub fn new(adc: A, board: BoardRevision) -> Self {
        Self { adc, board }
    }

    /// Convert a raw count to volts at the battery terminal.
    pub fn volts(&self, raw: u16) -> f32 {
        let full_scale = f32::from(self.adc.full_scale().max(1));
        (V_REF / full_scale) * self.board.divider() * f32::from(raw)
    }
}

impl<A: AnalogPort> Sensor for BatteryVoltage<A> {
    fn name(&self) -> &str {
        "BoardBattery"
    }

    fn variable_name(&self) -> &str {
        "batteryVoltage"
    }

    fn unit(&self) -> &str {
        "Volt"
    }

    fn value(&mut self) -> f32 {
        let raw = self.adc.read_raw();
        self.volts(raw)
    }

    fn decimals(&self) -> usize {
        3
    }
}
