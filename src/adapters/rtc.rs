//! Simulated real-time clock.
//!
//! On hardware the clock is a DS3231 ([`crate::drivers::ds3231`]).  On
//! host runs [`SimRtc`] keeps UTC in a shared cell, seeded from the system
//! clock, that only moves when something advances it (normally
//! [`SimSleep`](super::sleep::SimSleep)).  The die temperature is read from
//! a static for injection, the same way the on-board sensors are simulated.

use core::sync::atomic::{AtomicI32, Ordering};
use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use crate::app::ports::ClockPort;
use crate::error::ClockError;

/// Hundredths of a degree.
static SIM_RTC_TEMP_CENTI: AtomicI32 = AtomicI32::new(2_500);

pub fn sim_set_rtc_temperature(celsius: f32) {
    SIM_RTC_TEMP_CENTI.store((celsius * 100.0).round() as i32, Ordering::Relaxed);
}

/// Shared view of the simulated time, for whoever advances it.
#[derive(Clone, Default)]
pub struct SimTime {
    now: Rc<Cell<i64>>,
    faulty: Rc<Cell<bool>>,
}

impl SimTime {
    pub fn now(&self) -> i64 {
        self.now.get()
    }

    pub fn set(&self, utc_epoch: i64) {
        self.now.set(utc_epoch);
    }

    pub fn advance(&self, secs: i64) {
        self.now.set(self.now.get() + secs);
    }

    /// Make every clock access fail until cleared.
    pub fn set_fault(&self, faulty: bool) {
        self.faulty.set(faulty);
    }
}

pub struct SimRtc {
    time: SimTime,
    alarm_armed: bool,
    alarm_flag: bool,
}

impl SimRtc {
    pub fn new(utc_epoch: i64) -> Self {
        Self {
            time: SimTime { now: Rc::new(Cell::new(utc_epoch)), faulty: Rc::default() },
            alarm_armed: false,
            alarm_flag: false,
        }
    }

    /// Start at the host's current time.
    pub fn from_system_time() -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);
        Self::new(now)
    }

    pub fn time(&self) -> SimTime {
        self.time.clone()
    }

    pub fn alarm_armed(&self) -> bool {
        self.alarm_armed
    }

    /// Latch the alarm flag, as the chip does at second 00.
    pub fn fire_alarm(&mut self) {
        if self.alarm_armed {
            self.alarm_flag = true;
        }
    }

    pub fn alarm_pending(&self) -> bool {
        self.alarm_flag
    }

    fn check(&self) -> Result<(), ClockError> {
        if self.time.faulty.get() {
            Err(ClockError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl ClockPort for SimRtc {
    fn now(&mut self) -> Result<i64, ClockError> {
        self.check()?;
        Ok(self.time.now())
    }

    fn set_now(&mut self, utc_epoch: i64) -> Result<(), ClockError> {
        self.check()?;
        debug!("RTC(sim): set to {}", utc_epoch);
        self.time.set(utc_epoch);
        Ok(())
    }

    fn set_alarm_every_minute(&mut self) -> Result<(), ClockError> {
        self.check()?;
        self.alarm_armed = true;
        self.alarm_flag = false;
        Ok(())
    }

    fn clear_alarm_flag(&mut self) {
        self.alarm_flag = false;
    }

    fn temperature(&mut self) -> Result<f32, ClockError> {
        self.check()?;
        Ok(SIM_RTC_TEMP_CENTI.load(Ordering::Relaxed) as f32 / 100.0)
    }
}
