//! Schedule engine: wake/sleep cadence driven by the RTC.
//!
//! The RTC alarm fires every minute.  On each wake the engine re-reads the
//! clock; a wake whose local epoch is an exact multiple of the logging
//! interval is a *tick*.  Everything else goes straight back to sleep.
//!
//! ```text
//!   RTC alarm ──▶ refresh() ──▶ take_tick()? ──▶ (cycle) ──▶ enter_low_power()
//!                                   │ no                          ▲
//!                                   └─────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::app::ports::{ClockPort, SleepPort};
use crate::clock::{self, ClockSource};
use crate::error::ClockError;

/// Owns the clock, the last known epoch, and the sleep entry point.
pub struct ScheduleEngine<C: ClockPort, Z: SleepPort> {
    clock: ClockSource<C>,
    sleeper: Z,
    /// Interrupt interval, seconds.
    interval_secs: u32,
    /// True iff a wake line is wired.
    sleep_enabled: bool,
    /// Last good local epoch.  `None` until the RTC has answered once.
    epoch: Option<i64>,
    /// Local epoch of the last tick handed out by [`take_tick`](Self::take_tick).
    last_tick: Option<i64>,
    /// The previous reading was behind `epoch` and was not taken.
    held_backwards: bool,
}

impl<C: ClockPort, Z: SleepPort> ScheduleEngine<C, Z> {
    pub fn new(clock: ClockSource<C>, sleeper: Z, interval_minutes: u16, sleep_enabled: bool) -> Self {
        debug_assert!(interval_minutes > 0, "interval must be positive");
        Self {
            clock,
            sleeper,
            interval_secs: u32::from(interval_minutes.max(1)) * 60,
            sleep_enabled,
            epoch: None,
            last_tick: None,
            held_backwards: false,
        }
    }

    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    pub fn sleep_enabled(&self) -> bool {
        self.sleep_enabled
    }

    /// Last good local epoch.
    pub fn epoch(&self) -> Option<i64> {
        self.epoch
    }

    pub fn tz_hours(&self) -> i8 {
        self.clock.tz_hours()
    }

    /// `now` is on the logging grid.
    pub fn is_tick(&self, now: i64) -> bool {
        now.rem_euclid(i64::from(self.interval_secs)) == 0
    }

    /// Arm the every-minute alarm.  Nothing to do without a wake line.
    pub fn setup_sleep(&mut self) -> Result<(), ClockError> {
        if !self.sleep_enabled {
            info!("Scheduler: no wake line, sleep disabled");
            return Ok(());
        }
        self.clock.arm_minute_alarm()?;
        info!("Scheduler: minute alarm armed, interval {}s", self.interval_secs);
        Ok(())
    }

    /// Re-read the clock.  On failure the last known epoch is kept.  A
    /// single reading earlier than the last known epoch is held as a
    /// glitch; a second one in a row is taken as the new time, and the
    /// tick grid restarts from it.
    pub fn refresh(&mut self) -> Result<i64, ClockError> {
        match self.clock.now_local() {
            Ok(now) => match self.epoch {
                Some(last) if now < last && !self.held_backwards => {
                    warn!("Scheduler: clock went backwards ({now} < {last}), holding");
                    self.held_backwards = true;
                    Ok(last)
                }
                Some(last) if now < last => {
                    warn!("Scheduler: clock still behind ({now} < {last}), accepting");
                    self.held_backwards = false;
                    self.epoch = Some(now);
                    self.last_tick = None;
                    Ok(now)
                }
                _ => {
                    self.held_backwards = false;
                    self.epoch = Some(now);
                    Ok(now)
                }
            },
            Err(e) => {
                warn!("Scheduler: clock read failed: {e}, holding {:?}", self.epoch);
                Err(e)
            }
        }
    }

    /// Write a synced UTC epoch to the RTC.  The only path that may move
    /// the epoch backwards.
    pub fn apply_correction(&mut self, utc_epoch: i64) -> Result<(), ClockError> {
        self.clock.set_utc(utc_epoch)?;
        let local = self.clock.to_local(utc_epoch);
        info!("Scheduler: clock corrected to {}", self.clock.iso8601(local));
        self.held_backwards = false;
        self.epoch = Some(local);
        Ok(())
    }

    /// True once per tick instant: the current epoch is on the grid and has
    /// not been handed out before.
    pub fn take_tick(&mut self) -> bool {
        match self.epoch {
            Some(now) if self.is_tick(now) && self.last_tick != Some(now) => {
                self.last_tick = Some(now);
                true
            }
            _ => false,
        }
    }

    /// ISO-8601 timestamp of the current epoch.
    pub fn timestamp(&self) -> String {
        self.clock.iso8601(self.epoch.unwrap_or(0))
    }

    /// `YYYY-MM-DD` of the current epoch.
    pub fn date(&self) -> String {
        clock::date_stamp(self.epoch.unwrap_or(0))
    }

    pub fn clock_mut(&mut self) -> &mut ClockSource<C> {
        &mut self.clock
    }

    /// Acknowledge the alarm and suspend until the next one.
    pub fn enter_low_power(&mut self) {
        if !self.sleep_enabled {
            return;
        }
        self.clock.clear_alarm();
        debug!("Scheduler: entering low power");
        self.sleeper.enter_low_power();
        debug!("Scheduler: woke");
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
