//! CSV data logging to the removable medium.
//!
//! One file per logger per start date, `{logger_id}_{YYYY-MM-DD}.csv`:
//!
//! ```text
//! Data Logger: SL099
//! Sampling Feature UUID: 12345678-abcd-1234-efgh-1234567890ab
//! "Timestamp", "BoardRTC temperatureDatalogger degreeCelsius (uuid-1)", ...
//! 2017-06-01T12:00:00-05:00, 21.25, ...
//! ```
//!
//! The file is closed after every write so a pulled card loses at most the
//! line being written.  If the file has vanished when a record is appended,
//! a fresh one (named from the current date) is created, headed, and the
//! append retried once.

use log::{debug, info, warn};

use crate::app::ports::{OpenMode, StoragePort};
use crate::error::MediumError;
use crate::sensors::SensorReading;

/// Separator between CSV fields.
pub const SEPARATOR: &str = ", ";

/// One header column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub sensor: String,
    pub variable: String,
    pub unit: String,
    pub uuid: String,
}

impl Column {
    fn header(&self) -> String {
        format!("\"{} {} {} ({})\"", self.sensor, self.variable, self.unit, self.uuid)
    }
}

pub struct DataLogger<F: StoragePort> {
    medium: F,
    logger_id: String,
    sampling_feature: String,
    columns: Vec<Column>,
    /// Current file name, set by [`create_file`](Self::create_file).
    file_name: Option<String>,
}

impl<F: StoragePort> DataLogger<F> {
    pub fn new(medium: F, logger_id: &str, sampling_feature: &str, columns: Vec<Column>) -> Self {
        Self {
            medium,
            logger_id: logger_id.to_string(),
            sampling_feature: sampling_feature.to_string(),
            columns,
            file_name: None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn file_name_for(&self, date: &str) -> String {
        format!("{}_{}.csv", self.logger_id, date)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// `timestamp, v1, …, vn`.
    pub fn format_record(timestamp: &str, readings: &[SensorReading]) -> String {
        let mut line = String::with_capacity(timestamp.len() + readings.len() * 8);
        line.push_str(timestamp);
        for r in readings {
            line.push_str(SEPARATOR);
            line.push_str(&r.formatted);
        }
        line
    }

    /// The three header lines.
    pub fn header_lines(&self) -> [String; 3] {
        let mut columns = String::from("\"Timestamp\"");
        for c in &self.columns {
            columns.push_str(SEPARATOR);
            columns.push_str(&c.header());
        }
        [
            format!("Data Logger: {}", self.logger_id),
            format!("Sampling Feature UUID: {}", self.sampling_feature),
            columns,
        ]
    }

    /// Write the header into an open file.
    pub fn write_header(&mut self, file: &mut F::File) -> Result<(), MediumError> {
        for line in self.header_lines() {
            self.medium.append_line(file, &line)?;
        }
        Ok(())
    }

    /// Make `{logger_id}_{date}.csv` the current file, creating and heading
    /// it if it does not exist yet.
    pub fn create_file(&mut self, date: &str) -> Result<(), MediumError> {
        let name = self.file_name_for(date);
        if let Err(e) = self.medium.begin() {
            warn!("DataLogger: medium failed to initialise: {e}");
            return Err(e);
        }
        if self.medium.exists(&name) {
            info!("DataLogger: continuing {}", name);
        } else {
            let mut file = self.medium.open(&name, OpenMode::Create)?;
            let headed = self.write_header(&mut file);
            self.medium.close(file)?;
            headed?;
            info!("DataLogger: created {}", name);
        }
        self.file_name = Some(name);
        Ok(())
    }

    /// Append one line to the current file.  If the medium reports the file
    /// absent, start a new file for `date` and retry once.
    pub fn append(&mut self, line: &str, date: &str) -> Result<(), MediumError> {
        match self.try_append(line) {
            Err(MediumError::Absent) => {
                warn!("DataLogger: log file lost, starting a new one");
                self.create_file(date)?;
                self.try_append(line)
            }
            other => other,
        }
    }

    fn try_append(&mut self, line: &str) -> Result<(), MediumError> {
        self.medium.begin()?;
        let name = self.file_name.as_deref().ok_or(MediumError::Absent)?;
        let mut file = self.medium.open(name, OpenMode::Append)?;
        let written = self.medium.append_line(&mut file, line);
        let closed = self.medium.close(file);
        written.and(closed)?;
        debug!("DataLogger: {}", line);
        Ok(())
    }
}
