//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API: the device hard-resets if the main loop
//! stalls past the timeout without feeding. That reset is the system's
//! only recovery path from an unanticipated lockup — there is no
//! software-level retry behind it.
//!
//! The loop must call `feed()` on every tick.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op, {}ms timeout ignored", timeout_ms);
            Self {}
        }
    }

    /// Feed the watchdog. Must be called at least once per timeout period.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
