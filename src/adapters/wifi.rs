//! On-chip WiFi as the logger's modem.
//!
//! Implements [`ModemPort`] for the ESP32's own radio in station mode.  The
//! radio has no separate supply, so it pairs with
//! [`PowerScheme::AlwaysOn`](crate::power::PowerScheme::AlwaysOn) and
//! reports signal as RSSI in dBm.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulated association for host-side tests.

use log::{info, warn};

use crate::app::ports::ModemPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

/// Association poll step.
#[cfg(target_os = "espidf")]
const JOIN_POLL_MS: u32 = 100;

// ───────────────────────────────────────────────────────────────
// WiFi modem
// ───────────────────────────────────────────────────────────────

pub struct WifiModem {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: association state and a connect counter for
    /// deterministic failures.
    #[cfg(not(target_os = "espidf"))]
    associated: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
}

#[cfg(target_os = "espidf")]
impl WifiModem {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiModem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiModem {
    pub fn new() -> Self {
        Self { associated: false, sim_connect_counter: 0 }
    }
}

// ── Platform-specific ─────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiModem {
    fn platform_begin(&mut self) -> bool {
        if self.wifi.is_started().unwrap_or(false) {
            return true;
        }
        self.wifi.start().is_ok()
    }

    fn platform_connect(&mut self, ssid: &str, password: &str) -> bool {
        let (Ok(ssid), Ok(pwd)) = (ssid.try_into(), password.try_into()) else {
            warn!("WiFi: credentials too long");
            return false;
        };
        let auth_method = if password.is_empty() { AuthMethod::None } else { AuthMethod::WPA2Personal };
        let config = Configuration::Client(ClientConfiguration {
            ssid,
            password: pwd,
            auth_method,
            ..Default::default()
        });
        if let Err(e) = self.wifi.set_configuration(&config) {
            warn!("WiFi: set_configuration failed: {:?}", e);
            return false;
        }
        // Association completes asynchronously; wait_for_network() polls it.
        self.wifi.wifi_mut().connect().is_ok()
    }

    fn platform_is_connected(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn platform_wait(&mut self, timeout_ms: u32) -> bool {
        let mut waited = 0;
        loop {
            if self.platform_is_connected() {
                return self.wifi.wait_netif_up().is_ok();
            }
            if waited >= timeout_ms {
                return false;
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(JOIN_POLL_MS);
            waited += JOIN_POLL_MS;
        }
    }

    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
    }

    fn platform_rssi(&mut self) -> i32 {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: ap_info is a valid out-parameter; the driver is started.
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        if rc == esp_idf_svc::sys::ESP_OK as i32 { i32::from(ap_info.rssi) } else { 0 }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiModem {
    fn platform_begin(&mut self) -> bool {
        info!("WiFi(sim): driver started");
        true
    }

    fn platform_connect(&mut self, ssid: &str, _password: &str) -> bool {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        // Every 10th attempt fails to exercise the attach failure path.
        if self.sim_connect_counter % 10 == 3 {
            warn!("WiFi(sim): simulated auth failure (attempt {})", self.sim_connect_counter);
            return false;
        }
        info!("WiFi(sim): associated with '{}' (attempt {})", ssid, self.sim_connect_counter);
        self.associated = true;
        true
    }

    fn platform_is_connected(&mut self) -> bool {
        self.associated
    }

    fn platform_wait(&mut self, _timeout_ms: u32) -> bool {
        self.associated
    }

    fn platform_disconnect(&mut self) {
        self.associated = false;
        info!("WiFi(sim): disassociated");
    }

    fn platform_rssi(&mut self) -> i32 {
        if !self.associated {
            return 0;
        }
        // -66..=-55 dBm, following the connect counter.
        let oscillation = (self.sim_connect_counter % 12) as i32 - 6;
        -60 + oscillation
    }
}

// ───────────────────────────────────────────────────────────────
// ModemPort
// ───────────────────────────────────────────────────────────────

impl ModemPort for WifiModem {
    fn begin(&mut self) -> bool {
        let ok = self.platform_begin();
        if !ok {
            warn!("WiFi: driver start failed");
        }
        ok
    }

    /// The radio is on-chip; it answers whenever the driver is started.
    fn test_at(&mut self, _timeout_ms: u32) -> bool {
        self.platform_begin()
    }

    fn wait_for_network(&mut self, timeout_ms: u32) -> bool {
        self.platform_wait(timeout_ms)
    }

    fn network_connect(&mut self, ssid: &str, password: &str) -> bool {
        info!("WiFi: connecting to '{}'", ssid);
        self.platform_connect(ssid, password)
    }

    fn gprs_connect(&mut self, _apn: &str) -> bool {
        warn!("WiFi: no cellular data context on this radio");
        false
    }

    fn network_disconnect(&mut self) {
        if self.platform_is_connected() {
            self.platform_disconnect();
        }
    }

    fn gprs_disconnect(&mut self) {}

    fn signal_quality(&mut self) -> i32 {
        self.platform_rssi()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
