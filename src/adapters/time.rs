//! ESP32 time adapter.
//!
//! Provides the monotonic millisecond clock shared by the motion interrupt
//! and the control loop.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic,
//!   readable from ISR context).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::app::ports::ClockPort;

/// Milliseconds since boot, truncated to `u32`.  Safe to call from an ISR.
#[cfg(target_os = "espidf")]
pub fn uptime_ms_from_isr() -> u32 {
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1_000) as u32
}

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot, wrapping at `u32::MAX`.
    fn uptime_ms(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u32 {
        self.uptime_ms()
    }
}
