//! Signal-quality interpretation.
//!
//! Cellular modems answer `AT+CSQ` with a code 0–31 (99 = unknown); WiFi
//! and some radio modules report the RSSI magnitude directly.  Both are
//! normalised into a [`SignalQuality`] of dBm and percent.

use serde::{Deserialize, Serialize};

/// How the modem reports signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalFormat {
    /// `AT+CSQ` code, 0–31 or 99.
    Csq,
    /// RSSI in dBm as the radio reports it (e.g. -70).
    Rssi,
}

/// Normalised signal reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalQuality {
    /// RSSI, dBm.  CSQ-derived values are magnitudes (113..=51).  0 = unknown.
    pub rssi: i32,
    /// Signal strength, 0–100 %.
    pub percent: u8,
}

/// CSQ code reserved for "not known or not detectable".
pub const CSQ_UNKNOWN: i32 = 99;

/// Placeholder some modems report before they have measured anything.
pub const RSSI_NO_DATA: i32 = 162;

const CSQ_PERCENT: [u8; 32] = [
    0, 3, 6, 10, 13, 16, 19, 23, 26, 29, 32, 36, 39, 42, 45, 48, 52, 55, 58, 61, 65, 68, 71, 74,
    78, 81, 84, 87, 90, 94, 97, 100,
];

/// CSQ 0..=31 → RSSI magnitude 113..=51 in steps of 2.  Anything else → 0.
pub fn csq_to_rssi(csq: i32) -> i32 {
    if (0..=31).contains(&csq) { 113 - 2 * csq } else { 0 }
}

/// CSQ 0..=31 → percent from the fixed table.  Anything else → 0.
pub fn csq_to_percent(csq: i32) -> u8 {
    usize::try_from(csq)
        .ok()
        .and_then(|i| CSQ_PERCENT.get(i).copied())
        .unwrap_or(0)
}

/// Linear RSSI → percent fit, clamped to 0..=100.
pub fn rssi_to_percent(rssi: i32) -> u8 {
    if rssi == 0 || rssi == RSSI_NO_DATA {
        return 0;
    }
    let pct = (1.6163_f64 * f64::from(rssi) + 182.61).round();
    pct.clamp(0.0, 100.0) as u8
}

impl SignalQuality {
    /// Interpret a raw modem report.
    pub fn from_raw(raw: i32, format: SignalFormat) -> Self {
        match format {
            SignalFormat::Csq => Self { rssi: csq_to_rssi(raw), percent: csq_to_percent(raw) },
            SignalFormat::Rssi => Self { rssi: raw, percent: rssi_to_percent(raw) },
        }
    }
}
