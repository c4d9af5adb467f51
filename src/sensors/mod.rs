//! Sensor subsystem: on-board sensors and the ordered [`SensorArray`].
//!
//! The array owns every configured [`Sensor`] in column order.  Each tick
//! the orchestrator wakes them, reads them in order, and puts them straight
//! back to sleep.

pub mod battery;
pub mod board_temp;
pub mod free_heap;
pub mod modem_signal;

use crate::app::ports::Sensor;
use crate::datalog::Column;

/// Written to the log in place of a non-finite reading.
pub const MISSING_VALUE: &str = "-9999";

/// One variable's reading for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Column position, 0-based.
    pub index: usize,
    pub value: f32,
    /// `value` at the sensor's precision, or [`MISSING_VALUE`].
    pub formatted: String,
}

/// Render a value with `decimals` digits after the point.
pub fn format_value(value: f32, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        MISSING_VALUE.to_string()
    }
}

/// Ordered list of sensors, one log column each.
#[derive(Default)]
pub struct SensorArray {
    sensors: Vec<Box<dyn Sensor>>,
}

impl SensorArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Header columns, pairing each sensor with its variable UUID.
    /// Missing UUIDs are left empty.
    pub fn columns(&self, uuids: &[String]) -> Vec<Column> {
        self.sensors
            .iter()
            .enumerate()
            .map(|(i, s)| Column {
                sensor: s.name().to_string(),
                variable: s.variable_name().to_string(),
                unit: s.unit().to_string(),
                uuid: uuids.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn wake_all(&mut self) {
        for s in &mut self.sensors {
            s.wake();
        }
    }

    /// Read every sensor in column order.
    pub fn read_all(&mut self) -> Vec<SensorReading> {
        self.sensors
            .iter_mut()
            .enumerate()
            .map(|(index, s)| {
                let value = s.value();
                SensorReading { index, value, formatted: format_value(value, s.decimals()) }
            })
            .collect()
    }

    pub fn sleep_all(&mut self) {
        for s in &mut self.sensors {
            s.sleep();
        }
    }
}
