//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main task stops feeding it for longer than the
//! configured timeout.  The main loop calls [`Watchdog::feed`] every
//! iteration; the reconnect backoff sleeps through a [`FeedingDelay`] so a
//! long outage does not look like a hung task.

use core::time::Duration;

use embedded_hal::delay::DelayNs;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Default timeout.  Covers one backoff plus a slow broker handshake.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: core::cell::Cell<u32>,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls with a config that outlives them.
            unsafe {
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms, no-op", timeout_ms);
            Self {
                feeds: core::cell::Cell::new(0),
            }
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the calling task's TWDT entry.
            unsafe {
                esp_task_wdt_reset();
            }
        }

        #[cfg(not(target_os = "espidf"))]
        self.feeds.set(self.feeds.get().wrapping_add(1));
    }

    /// Number of feeds so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feed_count(&self) -> u32 {
        self.feeds.get()
    }
}

/// Blocking delay that feeds the watchdog at least once per slice.
pub struct FeedingDelay<'a> {
    watchdog: &'a Watchdog,
    slice_ms: u32,
}

impl<'a> FeedingDelay<'a> {
    pub fn new(watchdog: &'a Watchdog) -> Self {
        Self {
            watchdog,
            slice_ms: 1_000,
        }
    }

    pub fn with_slice_ms(mut self, slice_ms: u32) -> Self {
        self.slice_ms = slice_ms.max(1);
        self
    }
}

impl DelayNs for FeedingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
        self.watchdog.feed();
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut left = ms;
        while left > 0 {
            let chunk = left.min(self.slice_ms);
            std::thread::sleep(Duration::from_millis(u64::from(chunk)));
            self.watchdog.feed();
            left -= chunk;
        }
    }
}
