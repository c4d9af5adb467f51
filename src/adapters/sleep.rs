//! Low-power entry.
//!
//! - **`target_os = "espidf"`**: [`LightSleep`] arms a GPIO wakeup on the
//!   RTC's open-drain alarm line (active low) and enters light sleep.  RAM
//!   and the radio state survive, so the cycle resumes where it left off.
//! - **all targets**: [`SimSleep`] jumps simulated time to the next minute
//!   boundary, which is when the RTC alarm would have fired.

use log::debug;

use crate::app::ports::SleepPort;

use super::rtc::SimTime;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ───────────────────────────────────────────────────────────────
// Hardware light sleep
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct LightSleep {
    wake_gpio: i32,
}

#[cfg(target_os = "espidf")]
impl LightSleep {
    /// `wake_gpio` must already be configured as an input with pull-up.
    pub fn new(wake_gpio: i32) -> Self {
        Self { wake_gpio }
    }
}

#[cfg(target_os = "espidf")]
impl SleepPort for LightSleep {
    fn enter_low_power(&mut self) {
        // SAFETY: plain ESP-IDF sleep configuration calls on a valid GPIO
        // number, issued from the single main task.
        unsafe {
            let rc = gpio_wakeup_enable(self.wake_gpio, gpio_int_type_t_GPIO_INTR_LOW_LEVEL);
            if rc != ESP_OK as i32 {
                log::warn!("Power: gpio_wakeup_enable failed (rc={})", rc);
                return;
            }
            esp_sleep_enable_gpio_wakeup();
            debug!("Power: entering light sleep");
            esp_light_sleep_start();
            gpio_wakeup_disable(self.wake_gpio);
        }
        debug!("Power: woke (cause={})", unsafe { esp_sleep_get_wakeup_cause() });
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated sleep
// ───────────────────────────────────────────────────────────────

pub struct SimSleep {
    time: SimTime,
    sleeps: u32,
}

impl SimSleep {
    pub fn new(time: SimTime) -> Self {
        Self { time, sleeps: 0 }
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps
    }
}

impl SleepPort for SimSleep {
    fn enter_low_power(&mut self) {
        let now = self.time.now();
        let wake = (now.div_euclid(60) + 1) * 60;
        debug!("Power(sim): sleeping {} s", wake - now);
        self.time.set(wake);
        self.sleeps += 1;
    }
}
