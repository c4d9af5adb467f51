//! Monotonic timer adapters.
//!
//! - **`target_os = "espidf"`**: [`MonotonicTimer`] wraps
//!   `esp_timer_get_time()` (microsecond precision, monotonic) and
//!   FreeRTOS delays.
//! - **`not(target_os = "espidf")`**: the same type uses
//!   `std::time::Instant` and `std::thread::sleep`.
//!
//! [`ManualTimer`] is a virtual clock that only moves when someone delays
//! on it.  Simulation runs and host tests use it so that multi-second
//! modem timeouts complete instantly.

use std::cell::Cell;
use std::rc::Rc;

use crate::app::ports::TimerPort;

/// Real monotonic time.
#[derive(Clone, Copy)]
pub struct MonotonicTimer {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTimer {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimerPort for MonotonicTimer {
    #[cfg(target_os = "espidf")]
    fn millis(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// Virtual clock advanced only by [`delay_ms`](TimerPort::delay_ms).
/// Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualTimer {
    now_ms: Rc<Cell<u64>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without a delay call.
    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl TimerPort for ManualTimer {
    fn millis(&self) -> u64 {
        self.now_ms.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}
