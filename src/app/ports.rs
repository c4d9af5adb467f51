//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Orchestrator (domain)
//! ```
//!
//! Driven adapters (RTC, storage medium, modem, sensors, event sinks)
//! implement these traits.  The [`Orchestrator`](super::service::Orchestrator)
//! and the engines it owns consume them via generics, so the domain core
//! never touches hardware directly.

use core::cell::RefCell;
use std::rc::Rc;

use crate::error::{ClockError, MediumError};

// ───────────────────────────────────────────────────────────────
// Clock port (RTC peripheral)
// ───────────────────────────────────────────────────────────────

/// Battery-backed real-time clock.  All epochs are UTC seconds.
pub trait ClockPort {
    /// Current UTC epoch.
    fn now(&mut self) -> Result<i64, ClockError>;

    /// Overwrite the clock with a new UTC epoch.
    fn set_now(&mut self, utc_epoch: i64) -> Result<(), ClockError>;

    /// Arm the alarm to fire at the start of every minute.
    fn set_alarm_every_minute(&mut self) -> Result<(), ClockError>;

    /// Acknowledge a fired alarm so the interrupt line releases.
    fn clear_alarm_flag(&mut self);

    /// Die temperature of the clock chip, °C.
    fn temperature(&mut self) -> Result<f32, ClockError> {
        Err(ClockError::Unsupported)
    }
}

/// The RTC is read both by the scheduler and as a board temperature sensor.
impl<C: ClockPort> ClockPort for Rc<RefCell<C>> {
    fn now(&mut self) -> Result<i64, ClockError> {
        self.borrow_mut().now()
    }

    fn set_now(&mut self, utc_epoch: i64) -> Result<(), ClockError> {
        self.borrow_mut().set_now(utc_epoch)
    }

    fn set_alarm_every_minute(&mut self) -> Result<(), ClockError> {
        self.borrow_mut().set_alarm_every_minute()
    }

    fn clear_alarm_flag(&mut self) {
        self.borrow_mut().clear_alarm_flag();
    }

    fn temperature(&mut self) -> Result<f32, ClockError> {
        self.borrow_mut().temperature()
    }
}

// ───────────────────────────────────────────────────────────────
// Sleep port (platform low-power entry)
// ───────────────────────────────────────────────────────────────

/// Platform deep-idle.  Returns once the wake line fires.
pub trait SleepPort {
    fn enter_low_power(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Timer port (monotonic milliseconds + blocking delay)
// ───────────────────────────────────────────────────────────────

/// Monotonic time source used by every bounded wait in the core.
pub trait TimerPort {
    /// Milliseconds since an arbitrary fixed origin.
    fn millis(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);

    /// Poll `ready` every `step_ms` until it returns true or `timeout_ms`
    /// has elapsed.  Returns the final result of `ready`.
    fn poll_until(&self, timeout_ms: u32, step_ms: u32, mut ready: impl FnMut() -> bool) -> bool
    where
        Self: Sized,
    {
        let start = self.millis();
        loop {
            if ready() {
                return true;
            }
            if self.millis().saturating_sub(start) >= u64::from(timeout_ms) {
                return false;
            }
            self.delay_ms(step_ms);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Storage port (removable medium)
// ───────────────────────────────────────────────────────────────

/// How [`StoragePort::open`] treats a missing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file if missing, position at end otherwise.
    Create,
    /// The file must exist; a missing file is [`MediumError::Absent`].
    Append,
}

/// Removable storage (SD card).  Text files only.
pub trait StoragePort {
    type File;

    /// (Re-)initialise the medium.  Absent card → [`MediumError::Absent`].
    fn begin(&mut self) -> Result<(), MediumError>;

    fn exists(&mut self, name: &str) -> bool;

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Self::File, MediumError>;

    /// Write `line` followed by CRLF.
    fn append_line(&mut self, file: &mut Self::File, line: &str) -> Result<(), MediumError>;

    fn close(&mut self, file: Self::File) -> Result<(), MediumError>;

    /// Whole-file read, used for loading configuration.
    fn read_to_string(&mut self, name: &str) -> Result<String, MediumError>;
}

// ───────────────────────────────────────────────────────────────
// Modem port (AT-command driver)
// ───────────────────────────────────────────────────────────────

/// Command surface of the modem driver.  Each call blocks for at most the
/// given timeout (or the driver's own fixed one) and reports plain success.
pub trait ModemPort {
    /// Driver bring-up after power is applied.
    fn begin(&mut self) -> bool;

    /// Liveness probe: `AT` answered with `OK` within `timeout_ms`.
    fn test_at(&mut self, timeout_ms: u32) -> bool;

    /// Wait for network registration / association.
    fn wait_for_network(&mut self, timeout_ms: u32) -> bool;

    /// Send WiFi credentials.
    fn network_connect(&mut self, ssid: &str, password: &str) -> bool;

    /// Activate a cellular data context on `apn`.
    fn gprs_connect(&mut self, apn: &str) -> bool;

    fn network_disconnect(&mut self);

    fn gprs_disconnect(&mut self);

    /// Raw signal report: CSQ code (0–31, 99) or RSSI in dBm, depending
    /// on the modem's [`SignalFormat`](crate::modem::signal::SignalFormat).
    fn signal_quality(&mut self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Sensor port
// ───────────────────────────────────────────────────────────────

/// One measured variable.  The physical measurement is the driver's job.
pub trait Sensor {
    /// Sensor model, e.g. "DS3231".
    fn name(&self) -> &str;

    /// Measured variable, e.g. "Temperature".
    fn variable_name(&self) -> &str;

    fn unit(&self) -> &str;

    /// Take one reading.  Non-finite means "no valid reading".
    fn value(&mut self) -> f32;

    fn wake(&mut self) {}

    fn sleep(&mut self) {}

    /// Digits after the decimal point in the log.
    fn decimals(&self) -> usize {
        2
    }
}

/// Single-channel ADC referenced to 3.3 V.
pub trait AnalogPort {
    /// Raw count, 0..=[`full_scale`](Self::full_scale).
    fn read_raw(&mut self) -> u16;

    /// Count corresponding to the reference voltage.
    fn full_scale(&self) -> u16 {
        1023
    }
}

// ───────────────────────────────────────────────────────────────
// Indicator port
// ───────────────────────────────────────────────────────────────

/// A single on/off indicator LED.
pub trait IndicatorPort {
    fn set(&mut self, on: bool);
}

impl<P: embedded_hal::digital::OutputPin> IndicatorPort for P {
    fn set(&mut self, on: bool) {
        // LED failures are ignored.
        let _ = if on { self.set_high() } else { self.set_low() };
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
