//! Modem power sequencing.
//!
//! One [`PowerSequencer`] covers every wiring the logger supports; the
//! [`PowerScheme`] picked at configuration decides how the control line is
//! driven:
//!
//! | Scheme     | on()                      | off()                     |
//! |------------|---------------------------|---------------------------|
//! | `Held`     | control HIGH, kept        | control LOW               |
//! | `Reverse`  | control LOW, kept         | control HIGH              |
//! | `Pulsed`   | 2 s HIGH pulse            | 2 s HIGH pulse            |
//! | `AlwaysOn` | no-op                     | no-op                     |
//!
//! With a status line, state is always read from it; `on()`/`off()` wait
//! for it to settle.  Without one, the last commanded state is reported.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::TimerPort;

/// Length of the toggle pulse for `Pulsed` modems.
pub const PULSE_MS: u32 = 2_000;
/// Status line poll step.
pub const STATUS_POLL_STEP_MS: u32 = 10;
/// Upper bound on waiting for the status line to follow a command.
pub const STATUS_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerScheme {
    /// Control line held HIGH while on.
    Held,
    /// A fixed pulse toggles the modem; state comes from the status line.
    Pulsed,
    /// Control line held LOW while on.
    Reverse,
    /// No control line; the modem is always powered.
    AlwaysOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemPowerState {
    Off,
    On,
}

/// What the connectivity engine needs from power sequencing.
pub trait PowerControl {
    /// Power the modem up.  Returns whether it is on afterwards.
    fn on(&mut self) -> bool;

    /// Power the modem down.  Returns whether it is off afterwards.
    fn off(&mut self) -> bool;

    fn is_on(&mut self) -> bool;

    fn state(&mut self) -> ModemPowerState {
        if self.is_on() { ModemPowerState::On } else { ModemPowerState::Off }
    }
}

/// Drives the modem's supply, control and status lines.
pub struct PowerSequencer<O: OutputPin, I: InputPin, T: TimerPort> {
    scheme: PowerScheme,
    vcc: Option<O>,
    control: Option<O>,
    status: Option<I>,
    timer: T,
    commanded: ModemPowerState,
}

impl<O: OutputPin, I: InputPin, T: TimerPort> PowerSequencer<O, I, T> {
    pub fn new(scheme: PowerScheme, timer: T) -> Self {
        Self {
            scheme,
            vcc: None,
            control: None,
            status: None,
            timer,
            commanded: ModemPowerState::Off,
        }
    }

    pub fn with_vcc(mut self, pin: O) -> Self {
        self.vcc = Some(pin);
        self
    }

    pub fn with_control(mut self, pin: O) -> Self {
        self.control = Some(pin);
        self
    }

    pub fn with_status(mut self, pin: I) -> Self {
        self.status = Some(pin);
        self
    }

    pub fn scheme(&self) -> PowerScheme {
        self.scheme
    }

    fn drive(pin: &mut Option<O>, high: bool, what: &str) {
        if let Some(p) = pin {
            let res = if high { p.set_high() } else { p.set_low() };
            if res.is_err() {
                warn!("Power: failed to drive {what} line");
            }
        }
    }

    fn pulse(&mut self) {
        debug!("Power: {} ms pulse", PULSE_MS);
        Self::drive(&mut self.control, true, "control");
        self.timer.delay_ms(PULSE_MS);
        Self::drive(&mut self.control, false, "control");
    }

    /// Wait for the status line to report `want`.  No-op without one.
    fn settle(&mut self, want: bool) {
        if let Some(status) = self.status.as_mut() {
            let reached = self.timer.poll_until(STATUS_TIMEOUT_MS, STATUS_POLL_STEP_MS, || {
                status.is_high().map(|h| h == want).unwrap_or(false)
            });
            if !reached {
                warn!("Power: status line did not follow within {} ms", STATUS_TIMEOUT_MS);
            }
        }
    }
}

impl<O: OutputPin, I: InputPin, T: TimerPort> PowerControl for PowerSequencer<O, I, T> {
    fn on(&mut self) -> bool {
        if self.scheme == PowerScheme::AlwaysOn {
            return true;
        }
        if self.is_on() {
            debug!("Power: modem already on");
            return true;
        }

        Self::drive(&mut self.vcc, true, "vcc");
        match self.scheme {
            PowerScheme::Held => Self::drive(&mut self.control, true, "control"),
            PowerScheme::Reverse => Self::drive(&mut self.control, false, "control"),
            PowerScheme::Pulsed => self.pulse(),
            PowerScheme::AlwaysOn => {}
        }
        self.commanded = ModemPowerState::On;
        self.settle(true);

        let on = self.is_on();
        if on {
            info!("Power: modem on ({:?})", self.scheme);
        } else {
            warn!("Power: modem did not come up ({:?})", self.scheme);
        }
        on
    }

    fn off(&mut self) -> bool {
        if self.scheme == PowerScheme::AlwaysOn {
            return true;
        }
        if !self.is_on() {
            debug!("Power: modem already off");
            self.commanded = ModemPowerState::Off;
            return true;
        }

        match self.scheme {
            PowerScheme::Held => Self::drive(&mut self.control, false, "control"),
            PowerScheme::Reverse => Self::drive(&mut self.control, true, "control"),
            PowerScheme::Pulsed => self.pulse(),
            PowerScheme::AlwaysOn => {}
        }
        self.commanded = ModemPowerState::Off;
        self.settle(false);
        Self::drive(&mut self.vcc, false, "vcc");

        let off = !self.is_on();
        if off {
            info!("Power: modem off");
        } else {
            warn!("Power: modem still reports on");
        }
        off
    }

    fn is_on(&mut self) -> bool {
        if self.scheme == PowerScheme::AlwaysOn {
            return true;
        }
        match self.status.as_mut() {
            Some(status) => status
                .is_high()
                .unwrap_or(self.commanded == ModemPowerState::On),
            None => self.commanded == ModemPowerState::On,
        }
    }
}
