//! Free heap, logged as a diagnostic column.
//!
//! On ESP-IDF: `esp_get_free_heap_size()`.
//! On host/test: reads from a static AtomicU32 for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::Sensor;

#[cfg(not(target_os = "espidf"))]
static SIM_FREE_HEAP: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_free_heap(bytes: u32) {
    SIM_FREE_HEAP.store(bytes, Ordering::Relaxed);
}

#[derive(Default)]
pub struct FreeHeap;

impl FreeHeap {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "espidf")]
    fn bytes(&self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn bytes(&self) -> u32 {
        SIM_FREE_HEAP.load(Ordering::Relaxed)
    }
}

impl Sensor for FreeHeap {
    fn name(&self) -> &str {
        "BoardHeap"
    }

    fn variable_name(&self) -> &str {
        "freeHeap"
    }

    fn unit(&self) -> &str {
        "Byte"
    }

    fn value(&mut self) -> f32 {
        self.bytes() as f32
    }

    fn decimals(&self) -> usize {
        0
    }
}
