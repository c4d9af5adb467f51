//! Simulated digital line for host runs and tests.
//!
//! On hardware the ESP-IDF `PinDriver` already implements the
//! `embedded_hal::digital` traits and is used directly.  [`SimPin`] stands
//! in for it elsewhere: clones share one level, so a test can hold the
//! "far end" of a line that a component drives or reads.

use core::convert::Infallible;
use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

#[derive(Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self { level: Rc::new(Cell::new(high)) }
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Drive the line from the far end.
    pub fn drive(&self, high: bool) {
        self.level.set(high);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}
