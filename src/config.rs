//! Logger configuration.
//!
//! All deployment parameters for one logger: clock offset, cadence,
//! identifiers for the remote collector, and the optional modem/upload
//! sections.  Immutable once the orchestrator is built.
//! Loaded from `logger.json` on the storage medium, falling back to
//! [`LoggerConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::modem::signal::SignalFormat;
use crate::pins;
use crate::power::PowerScheme;
use crate::sensors::battery::BoardRevision;

/// Core logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    // --- Clock ---
    /// Offset of local time from UTC, whole hours (-24..=24).
    pub timezone_hours: i8,

    // --- Board lines ---
    /// Chip-select line of the storage medium.
    pub sd_select_pin: i32,
    /// RTC alarm interrupt line.  `None` disables sleeping between wakes.
    pub wake_pin: Option<i32>,
    /// LED lit while a tick is being processed.
    pub alert_led_pin: Option<i32>,
    /// Board revision, selects the battery divider.
    pub board: BoardRevision,

    // --- Cadence ---
    /// Logging interval in whole minutes.
    pub interval_minutes: u16,

    // --- Identity ---
    pub logger_id: String,
    pub sampling_feature: String,
    /// One UUID per sensor channel, same order as the sensor list.
    pub variable_uuids: Vec<String>,

    // --- Remote upload (both sections required to upload) ---
    pub modem: Option<ModemConfig>,
    pub upload: Option<UploadConfig>,
}

/// Modem wiring and network parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    pub power_scheme: PowerScheme,
    /// Supply switch line, if the board can cut modem power.
    pub vcc_pin: Option<i32>,
    /// Status (CTS) line reporting whether the modem is awake.
    pub status_pin: Option<i32>,
    /// On/off (DTR/Key) control line.
    pub on_off_pin: Option<i32>,
    /// How the modem reports signal strength.
    pub signal_format: SignalFormat,
    pub link: LinkConfig,
}

/// Which attach path the modem takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LinkConfig {
    /// WiFi association with stored credentials.
    Wifi {
        ssid: heapless::String<32>,
        password: heapless::String<64>,
    },
    /// Cellular data context on the given access point.
    Cellular { apn: String },
}

/// Remote collector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Registration token sent in the `TOKEN` header.
    pub registration_token: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            registration_token: String::new(),
            host: "data.envirodiy.org".into(),
            port: 80,
            path: "/api/data-stream/".into(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            timezone_hours: -5,

            sd_select_pin: pins::SD_SELECT_GPIO,
            wake_pin: Some(pins::RTC_INT_GPIO),
            alert_led_pin: Some(pins::ALERT_LED_GPIO),
            board: BoardRevision::V0_5,

            interval_minutes: 5,

            logger_id: "FieldLogger".into(),
            sampling_feature: String::new(),
            variable_uuids: Vec::new(),

            modem: None,
            upload: None,
        }
    }
}

impl LoggerConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if !(-24..=24).contains(&self.timezone_hours) {
            return Err(Error::Config("timezone_hours must be -24..=24"));
        }
        if self.interval_minutes == 0 {
            return Err(Error::Config("interval_minutes must be > 0"));
        }
        if self.logger_id.is_empty() {
            return Err(Error::Config("logger_id must not be empty"));
        }
        if !self.logger_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            return Err(Error::Config("logger_id must be a valid file-name stem"));
        }
        if let Some(modem) = &self.modem {
            modem.validate()?;
        }
        if self.upload.is_some() {
            if self.modem.is_none() {
                return Err(Error::Config("upload requires a modem section"));
            }
            if self.sampling_feature.is_empty() {
                return Err(Error::Config("upload requires a sampling_feature"));
            }
        }
        Ok(())
    }

    /// Interval between ticks in seconds.
    pub fn interval_secs(&self) -> u32 {
        u32::from(self.interval_minutes) * 60
    }

    /// Whether the remote upload path is configured.
    pub fn upload_enabled(&self) -> bool {
        self.modem.is_some() && self.upload.is_some()
    }
}

impl ModemConfig {
    fn validate(&self) -> Result<(), Error> {
        match &self.link {
            LinkConfig::Wifi { ssid, password } => {
                if ssid.is_empty() || !is_printable_ascii(ssid) {
                    return Err(Error::Config("SSID must be 1-32 printable ASCII bytes"));
                }
                if !password.is_empty() && password.len() < 8 {
                    return Err(Error::Config("password must be empty or 8-64 bytes"));
                }
            }
            LinkConfig::Cellular { apn } => {
                if apn.is_empty() {
                    return Err(Error::Config("APN must not be empty"));
                }
            }
        }
        if self.power_scheme != PowerScheme::AlwaysOn && self.on_off_pin.is_none() {
            return Err(Error::Config("power scheme requires an on/off pin"));
        }
        Ok(())
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}
