//! One-shot ADC channel for the battery divider.
//!
//! On ESP-IDF: ADC1 in one-shot mode, 12 dB attenuation, 12-bit.
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::AnalogPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// 12-bit converter.
pub const ADC_FULL_SCALE: u16 = 4_095;

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcInitError(pub i32);

impl core::fmt::Display for AdcInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ADC1 init failed (rc={})", self.0)
    }
}

impl std::error::Error for AdcInitError {}

pub struct OneshotAdc {
    #[cfg(target_os = "espidf")]
    handle: adc_oneshot_unit_handle_t,
    #[cfg(target_os = "espidf")]
    channel: adc_channel_t,
}

#[cfg(target_os = "espidf")]
impl OneshotAdc {
    /// Claim ADC1 and configure `channel`.  Call once at boot.
    pub fn new(channel: u32) -> Result<Self, AdcInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: both configs outlive the calls; the handle is written once.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(AdcInitError(ret));
        }
        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(AdcInitError(ret));
        }
        log::info!("ADC: ADC1 channel {} configured", channel);
        Ok(Self { handle, channel })
    }
}

#[cfg(not(target_os = "espidf"))]
impl OneshotAdc {
    pub fn new(_channel: u32) -> Result<Self, AdcInitError> {
        Ok(Self {})
    }
}

impl AnalogPort for OneshotAdc {
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> u16 {
        let mut raw: i32 = 0;
        // SAFETY: handle was created in new() and is owned by self.
        let ret = unsafe { adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return 0;
        }
        raw.clamp(0, i32::from(ADC_FULL_SCALE)) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> u16 {
        SIM_BATTERY_ADC.load(Ordering::Relaxed).min(ADC_FULL_SCALE)
    }

    fn full_scale(&self) -> u16 {
        ADC_FULL_SCALE
    }
}
