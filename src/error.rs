//! Unified error types for the logger firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be handed to the event sink and stored in cycle reports without
//! allocation.
//!
//! None of these halt the device: the orchestrator logs them, emits an
//! [`AppEvent::Fault`](crate::app::events::AppEvent::Fault), and carries on
//! to sleep.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The real-time clock could not be read or written.
    Clock(ClockError),
    /// The removable storage medium failed.
    Medium(MediumError),
    /// The modem or network link failed.
    Modem(ModemError),
    /// The data upload did not succeed.
    Upload(UploadError),
    /// The network time exchange produced no usable answer.
    Sync(SyncError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Medium(e) => write!(f, "medium: {e}"),
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Upload(e) => write!(f, "upload: {e}"),
            Self::Sync(e) => write!(f, "time sync: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The RTC did not answer; the last good epoch is reused.
    Unavailable,
    /// The clock peripheral does not provide this capability.
    Unsupported,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "RTC unavailable"),
            Self::Unsupported => write!(f, "operation not supported by RTC"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Storage medium errors
// ---------------------------------------------------------------------------

/// `Absent` must stay distinct from `Io`: only an absent file triggers the
/// recreate-and-retry path in the data logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediumError {
    /// The card or the target file is missing.
    Absent,
    /// Any other read/write failure.
    Io,
}

impl fmt::Display for MediumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "medium or file absent"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<MediumError> for Error {
    fn from(e: MediumError) -> Self {
        Self::Medium(e)
    }
}

// ---------------------------------------------------------------------------
// Modem / link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// The modem still reports off after a power-on attempt (or refused to turn off).
    PowerFailure,
    /// The modem did not answer the liveness probe.
    NotResponding,
    /// Network registration or association timed out.
    AttachTimeout,
    /// A byte-stream call was made while the link was not attached.
    NotAttached,
    /// The TCP connection to the remote host could not be opened.
    ConnectFailed,
    /// Writing to the byte stream failed; the link is dropped.
    SendFailed,
    /// Reading from the byte stream failed.
    ReceiveFailed,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerFailure => write!(f, "modem failed to change power state"),
            Self::NotResponding => write!(f, "modem does not respond to AT commands"),
            Self::AttachTimeout => write!(f, "network attach timed out"),
            Self::NotAttached => write!(f, "network not attached"),
            Self::ConnectFailed => write!(f, "connection to host failed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::ReceiveFailed => write!(f, "receive failed"),
        }
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

// ---------------------------------------------------------------------------
// Upload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// No 12-byte response within the wait window (reported as 504).
    Timeout,
    /// The collector could not be reached at all (reported as 0).
    Unreachable,
    /// The collector answered with a non-2xx status.
    Rejected(u16),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "no response from collector"),
            Self::Unreachable => write!(f, "collector unreachable"),
            Self::Rejected(code) => write!(f, "collector answered HTTP {code}"),
        }
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

// ---------------------------------------------------------------------------
// Time sync errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The time service never delivered its four bytes.
    NoResponse,
    /// The decoded time fell outside the plausible window.
    OutOfRange,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no answer from time service"),
            Self::OutOfRange => write!(f, "time outside plausible range"),
        }
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
