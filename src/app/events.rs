//! Outbound application events.
//!
//! The [`Orchestrator`](super::service::Orchestrator) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the stock one writes them to the log.

use crate::error::Error;
use crate::fsm::CyclePhase;
use crate::modem::signal::SignalQuality;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Start-up finished.  Carries the log file in use, if any.
    Started { logger_id: String, file: Option<String> },

    /// The cycle moved between phases.
    PhaseChanged { from: CyclePhase, to: CyclePhase },

    /// A record reached the storage medium.
    RecordLogged { line: String },

    /// Signal strength measured after attaching.
    Signal(SignalQuality),

    /// HTTP status of the upload (0 = no connection, 504 = no answer).
    UploadResult { status: u16 },

    /// The RTC was corrected from the network time service.
    ClockSynced { utc_epoch: i64 },

    /// A non-fatal failure.  The cycle carries on.
    Fault(Error),
}
