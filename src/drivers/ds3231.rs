//! DS3231 real-time clock driver.
//!
//! Register-level driver over any `embedded_hal::i2c::I2c` bus (the
//! ESP-IDF `I2cDriver` on hardware, a register-file fake in tests).
//!
//! The chip keeps UTC in BCD registers 0x00..=0x06, runs alarm 2 as the
//! once-a-minute wake source on its open-drain INT/SQW line, and exposes
//! its die temperature at 0x11..=0x12 in quarter degrees.

use chrono::{DateTime, Datelike, NaiveDate, Timelike};
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, warn};

use crate::app::ports::ClockPort;
use crate::error::ClockError;

pub const I2C_ADDR: u8 = 0x68;

const REG_SECONDS: u8 = 0x00;
const REG_ALARM2_MINUTES: u8 = 0x0B;
const REG_CONTROL: u8 = 0x0E;
const REG_STATUS: u8 = 0x0F;
const REG_TEMP_MSB: u8 = 0x11;

/// Alarm mask bit: "don't care" for that field.
const ALARM_MASK: u8 = 0x80;
const CONTROL_INTCN: u8 = 0x04;
const CONTROL_A2IE: u8 = 0x02;
const CONTROL_A1IE: u8 = 0x01;
const STATUS_A2F: u8 = 0x02;
const STATUS_A1F: u8 = 0x01;
const HOUR_12H_MODE: u8 = 0x40;
const MONTH_CENTURY: u8 = 0x80;

/// Years the two-digit year register can hold.
const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2099;

pub struct Ds3231<B: I2c> {
    bus: B,
}

impl<B: I2c> Ds3231<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn read_regs(&mut self, start: u8, buf: &mut [u8]) -> Result<(), ClockError> {
        self.bus.write_read(I2C_ADDR, &[start], buf).map_err(|e| {
            warn!("DS3231: read of 0x{:02x} failed: {:?}", start, e.kind());
            ClockError::Unavailable
        })
    }

    fn write_regs(&mut self, bytes: &[u8]) -> Result<(), ClockError> {
        self.bus.write(I2C_ADDR, bytes).map_err(|e| {
            warn!("DS3231: write failed: {:?}", e.kind());
            ClockError::Unavailable
        })
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, ClockError> {
        let mut b = [0u8; 1];
        self.read_regs(reg, &mut b)?;
        Ok(b[0])
    }
}

impl<B: I2c> ClockPort for Ds3231<B> {
    fn now(&mut self) -> Result<i64, ClockError> {
        let mut r = [0u8; 7];
        self.read_regs(REG_SECONDS, &mut r)?;
        if r[2] & HOUR_12H_MODE != 0 {
            debug!("DS3231: 12-hour mode set, reading as 24-hour");
        }
        let year = MIN_YEAR + i32::from(from_bcd(r[6]));
        let month = u32::from(from_bcd(r[5] & !MONTH_CENTURY));
        let day = u32::from(from_bcd(r[4]));
        let hour = u32::from(from_bcd(r[2] & 0x3F));
        let minute = u32::from(from_bcd(r[1]));
        let second = u32::from(from_bcd(r[0] & 0x7F));
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|dt| dt.and_utc().timestamp())
            .ok_or(ClockError::Unavailable)
    }

    fn set_now(&mut self, utc_epoch: i64) -> Result<(), ClockError> {
        let dt = DateTime::from_timestamp(utc_epoch, 0).ok_or(ClockError::Unsupported)?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&dt.year()) {
            return Err(ClockError::Unsupported);
        }
        self.write_regs(&[
            REG_SECONDS,
            to_bcd(dt.second() as u8),
            to_bcd(dt.minute() as u8),
            to_bcd(dt.hour() as u8),
            dt.weekday().number_from_monday() as u8,
            to_bcd(dt.day() as u8),
            to_bcd(dt.month() as u8),
            to_bcd((dt.year() - MIN_YEAR) as u8),
        ])
    }

    fn set_alarm_every_minute(&mut self) -> Result<(), ClockError> {
        // Alarm 2 fires at second 00 when minutes, hours and date are all masked.
        self.write_regs(&[REG_ALARM2_MINUTES, ALARM_MASK, ALARM_MASK, ALARM_MASK])?;
        let control = self.read_reg(REG_CONTROL)?;
        let control = (control | CONTROL_INTCN | CONTROL_A2IE) & !CONTROL_A1IE;
        self.write_regs(&[REG_CONTROL, control])?;
        self.clear_alarm_flag();
        Ok(())
    }

    fn clear_alarm_flag(&mut self) {
        let cleared = self
            .read_reg(REG_STATUS)
            .and_then(|s| self.write_regs(&[REG_STATUS, s & !(STATUS_A1F | STATUS_A2F)]));
        if cleared.is_err() {
            warn!("DS3231: could not clear alarm flag");
        }
    }

    fn temperature(&mut self) -> Result<f32, ClockError> {
        let mut t = [0u8; 2];
        self.read_regs(REG_TEMP_MSB, &mut t)?;
        Ok(f32::from(t[0] as i8) + f32::from(t[1] >> 6) * 0.25)
    }
}

fn from_bcd(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0x0F)
}

fn to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}
