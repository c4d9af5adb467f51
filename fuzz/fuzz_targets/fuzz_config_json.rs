//! Fuzz target: `LoggerConfig::from_json`
//!
//! `logger.json` lives on a removable card and may hold anything.  Loading
//! must never panic, and whatever it accepts must pass validation again
//! after a serialise/parse round trip.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use fieldlogger::config::LoggerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = LoggerConfig::from_json(text) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.interval_secs() >= 60);
        let again = serde_json::to_string(&cfg).expect("accepted config serialises");
        assert!(LoggerConfig::from_json(&again).is_ok(), "round trip rejected");
    }
});
