//! Clock source: RTC access plus the logger's local-time view.
//!
//! The RTC always holds UTC.  The logger works in "local epoch" seconds,
//! which is UTC shifted by the configured whole-hour offset; timestamps in
//! the log and upload payload carry that offset as an ISO-8601 suffix.

use chrono::{DateTime, Utc};

use crate::app::ports::ClockPort;
use crate::error::ClockError;

/// Seconds per hour of timezone offset.
const SECS_PER_HOUR: i64 = 3_600;

/// Wraps the RTC with a fixed timezone offset.
pub struct ClockSource<C: ClockPort> {
    rtc: C,
    tz_hours: i8,
}

impl<C: ClockPort> ClockSource<C> {
    pub fn new(rtc: C, tz_hours: i8) -> Self {
        Self { rtc, tz_hours }
    }

    pub fn rtc(&self) -> &C {
        &self.rtc
    }

    pub fn rtc_mut(&mut self) -> &mut C {
        &mut self.rtc
    }

    pub fn tz_hours(&self) -> i8 {
        self.tz_hours
    }

    pub fn now_utc(&mut self) -> Result<i64, ClockError> {
        self.rtc.now()
    }

    /// Current local epoch (UTC + offset).
    pub fn now_local(&mut self) -> Result<i64, ClockError> {
        Ok(self.rtc.now()? + self.offset_secs())
    }

    pub fn set_utc(&mut self, utc_epoch: i64) -> Result<(), ClockError> {
        self.rtc.set_now(utc_epoch)
    }

    pub fn arm_minute_alarm(&mut self) -> Result<(), ClockError> {
        self.rtc.set_alarm_every_minute()
    }

    pub fn clear_alarm(&mut self) {
        self.rtc.clear_alarm_flag();
    }

    pub fn to_local(&self, utc_epoch: i64) -> i64 {
        utc_epoch + self.offset_secs()
    }

    /// ISO-8601 rendering of a local epoch with this clock's offset.
    pub fn iso8601(&self, local_epoch: i64) -> String {
        iso8601(local_epoch, self.tz_hours)
    }

    fn offset_secs(&self) -> i64 {
        i64::from(self.tz_hours) * SECS_PER_HOUR
    }
}

fn calendar(local_epoch: i64) -> DateTime<Utc> {
    // Out-of-range epochs render as 1970-01-01 rather than failing the record.
    DateTime::from_timestamp(local_epoch, 0).unwrap_or_default()
}

/// `YYYY-MM-DDTHH:MM:SS` followed by `Z` or `±HH:00`.
pub fn iso8601(local_epoch: i64, tz_hours: i8) -> String {
    let mut out = calendar(local_epoch).format("%Y-%m-%dT%H:%M:%S").to_string();
    out.push_str(&tz_suffix(tz_hours));
    out
}

/// `YYYY-MM-DD` of a local epoch, used in log file names.
pub fn date_stamp(local_epoch: i64) -> String {
    calendar(local_epoch).format("%Y-%m-%d").to_string()
}

pub fn tz_suffix(tz_hours: i8) -> String {
    match tz_hours {
        0 => "Z".to_string(),
        h if h > 0 => format!("+{h:02}:00"),
        h => format!("-{:02}:00", h.unsigned_abs()),
    }
}
