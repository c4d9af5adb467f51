//! Board temperature from the RTC's on-die sensor.
//!
//! The DS3231 compensates its oscillator with an internal thermometer
//! (0.25 °C resolution, ±3 °C accuracy).  The RTC handle is shared with the
//! scheduler, hence the `Rc<RefCell<_>>`.

use core::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::app::ports::{ClockPort, Sensor};

pub struct BoardTemperature<C: ClockPort> {
    rtc: Rc<RefCell<C>>,
}

impl<C: ClockPort> BoardTemperature<C> {
    pub fn new(rtc: Rc<RefCell<C>>) -> Self {
        Self { rtc }
    }
}

impl<C: ClockPort> Sensor for BoardTemperature<C> {
    fn name(&self) -> &str {
        "BoardRTC"
    }

    fn variable_name(&self) -> &str {
        "temperatureDatalogger"
    }

    fn unit(&self) -> &str {
        "degreeCelsius"
    }

    fn value(&mut self) -> f32 {
        match self.rtc.borrow_mut().temperature() {
            Ok(c) => c,
            Err(e) => {
                warn!("BoardTemp: {e}");
                f32::NAN
            }
        }
    }
}
