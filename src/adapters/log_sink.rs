//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future telemetry adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { logger_id, file } => {
                info!("START | logger={} | file={}", logger_id, file.as_deref().unwrap_or("<none>"));
            }
            AppEvent::PhaseChanged { from, to } => {
                debug!("CYCLE | {} -> {}", from.name(), to.name());
            }
            AppEvent::RecordLogged { line } => {
                info!("RECORD | {}", line);
            }
            AppEvent::Signal(q) => {
                info!("SIGNAL | rssi={} dBm | {}%", q.rssi, q.percent);
            }
            AppEvent::UploadResult { status } => {
                info!("UPLOAD | status={}", status);
            }
            AppEvent::ClockSynced { utc_epoch } => {
                info!("CLOCK | synced to {}", utc_epoch);
            }
            AppEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}
