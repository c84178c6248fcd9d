//! Hardware adapter — bridges real peripherals to [`HardwareIo`].
//!
//! This is the only module (together with the raw helpers in
//! `drivers::hw_init`) that touches actual registers. On non-espidf
//! targets the underlying helpers are cfg-gated simulation stubs, so the
//! same binary runs on a workstation for bring-up.

use crate::app::ports::HardwareIo;
use crate::config::PinId;
use crate::drivers::hw_init;
use crate::drivers::watchdog::Watchdog;

/// Concrete adapter over the ESP32 peripherals and the task watchdog.
pub struct EspHardwareIo {
    watchdog: Watchdog,
}

impl EspHardwareIo {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }
}

impl HardwareIo for EspHardwareIo {
    fn read_digital(&mut self, pin: PinId) -> bool {
        hw_init::gpio_read(pin)
    }

    fn write_digital(&mut self, pin: PinId, high: bool) {
        hw_init::gpio_write(pin, high);
    }

    fn claim_output(&mut self, pin: PinId, pwm: bool) {
        if pwm {
            hw_init::ledc_claim(pin);
        } else {
            hw_init::gpio_claim_output(pin);
        }
    }

    fn set_pwm(&mut self, pin: PinId, freq_hz: u32, duty: u16) {
        hw_init::ledc_set(pin, freq_hz, duty);
    }

    fn read_analog(&mut self, channel: u32) -> u16 {
        hw_init::adc_read(channel)
    }

    fn feed_watchdog(&mut self) {
        self.watchdog.feed();
    }
}
