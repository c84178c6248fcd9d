//! One-shot hardware peripheral initialization and register-level helpers.
//!
//! Configures the ADC oneshot unit, the interrupt-watched input pins, and
//! the LEDC timer using raw ESP-IDF sys calls, driven by the loaded
//! [`Config`]. Output pins and LEDC channels are *not* configured here —
//! they are claimed lazily through [`gpio_claim_output`] / [`ledc_claim`]
//! the first time an actuator command arrives.
//!
//! Every helper has a host-side stub so the rest of the firmware builds
//! and runs in simulation.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::{Config, PinId};
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── One-shot init ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &Config) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop starts; single-threaded.
    unsafe {
        init_adc()?;
        init_inputs(config)?;
        init_ledc_timer()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_config: &Config) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: handle was created above; channel config is a one-shot call.
    let ret = unsafe {
        adc_oneshot_config_channel(ADC1_HANDLE, pins::SENSOR_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 configured (CH{}=sensor)", pins::SENSOR_ADC_CHANNEL);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once during init_adc() before this is
    // reachable; main-loop access only.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, channel, &mut raw) };
    if ret != ESP_OK {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::AtomicU16;

    /// Host-side injectable ADC reading.
    pub static SIM_ADC: AtomicU16 = AtomicU16::new(0);
}

/// Host-side injection point for the simulated ADC.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(raw: u16) {
    sim::SIM_ADC.store(raw, core::sync::atomic::Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn adc_read(_channel: u32) -> u16 {
    sim::SIM_ADC.load(core::sync::atomic::Ordering::Relaxed)
}

// ── Input pins + edge ISRs ────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_gpio_isr(_arg: *mut core::ffi::c_void) {
    // The entire ISR budget: one atomic store. Which pin moved is
    // re-derived by the main loop from current levels.
    crate::edge::edge_isr_handler();
}

#[cfg(target_os = "espidf")]
unsafe fn init_inputs(config: &Config) -> Result<(), HwInitError> {
    for input in &config.inputs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << input.pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: {} input pins configured (pull-up)", config.inputs.len());
    Ok(())
}

/// Install the GPIO ISR service and hook every configured input pin,
/// both edges. Call after [`init_peripherals`] and before the loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(config: &Config) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The registered handler
    // only performs one lock-free atomic store.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for input in &config.inputs {
            gpio_set_intr_type(input.pin, gpio_int_type_t_GPIO_INTR_ANYEDGE);
            gpio_isr_handler_add(input.pin, Some(edge_gpio_isr), core::ptr::null_mut());
            gpio_intr_enable(input.pin);
            info!("hw_init: watching pin {} = '{}'", input.pin, input.name);
        }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_config: &Config) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: PinId) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: PinId) -> bool {
    // Pull-up idle level.
    true
}

// ── Output pins (lazily claimed) ──────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_claim_output(pin: PinId) {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: one-shot direction claim from the main loop; the pin number
    // came from the validated config.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        log::warn!("gpio_claim_output({}) failed (rc={})", pin, ret);
        return;
    }
    unsafe {
        gpio_set_level(pin, 0);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_claim_output(pin: PinId) {
    log::info!("hw_init(sim): claim output pin {}", pin);
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: PinId, high: bool) {
    // SAFETY: gpio_set_level writes to an already-claimed output pin;
    // main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: PinId, high: bool) {
    log::info!("hw_init(sim): pin {} -> {}", pin, u8::from(high));
}

// ── LEDC PWM ─────────────────────────────────────────────────

// All PWM outputs share LEDC timer 0, so a frequency change applies to
// every claimed channel. One PWM output in the default config makes this
// a non-issue; revisit if a board ever carries two independent tones.

#[cfg(target_os = "espidf")]
mod ledc_table {
    use core::sync::atomic::AtomicI32;

    #[allow(clippy::declare_interior_mutable_const)]
    const FREE: AtomicI32 = AtomicI32::new(-1);
    /// Channel slot -> claimed pin (-1 = free). Main-loop access only.
    pub static PIN_FOR_CHANNEL: [AtomicI32; crate::pins::PWM_CHANNEL_COUNT] =
        [FREE; crate::pins::PWM_CHANNEL_COUNT];
}

#[cfg(target_os = "espidf")]
unsafe fn init_ledc_timer() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
        freq_hz: 1_000,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: one-shot timer configuration from the init path.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }
    info!("hw_init: LEDC timer 0 configured ({}-bit)", pins::PWM_RESOLUTION_BITS);
    Ok(())
}

#[cfg(target_os = "espidf")]
fn ledc_channel_for(pin: PinId) -> Option<u32> {
    use core::sync::atomic::Ordering;
    ledc_table::PIN_FOR_CHANNEL
        .iter()
        .position(|slot| slot.load(Ordering::Relaxed) == pin)
        .map(|i| i as u32)
}

/// Attach `pin` to the next free LEDC channel, duty 0. Idempotent.
#[cfg(target_os = "espidf")]
pub fn ledc_claim(pin: PinId) {
    use core::sync::atomic::Ordering;

    if ledc_channel_for(pin).is_some() {
        return;
    }
    let Some(slot) = ledc_table::PIN_FOR_CHANNEL
        .iter()
        .position(|slot| slot.load(Ordering::Relaxed) == -1)
    else {
        log::warn!("ledc_claim({}): no free channel", pin);
        return;
    };
    ledc_table::PIN_FOR_CHANNEL[slot].store(pin, Ordering::Relaxed);

    // SAFETY: channel config is a one-shot call per slot from the main loop.
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: slot as u32,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pin,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK {
        log::warn!("ledc_claim({}) channel config failed (rc={})", pin, ret);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_claim(pin: PinId) {
    log::info!("hw_init(sim): claim PWM pin {}", pin);
}

/// Reprogram frequency and duty on a claimed PWM pin.
#[cfg(target_os = "espidf")]
pub fn ledc_set(pin: PinId, freq_hz: u32, duty: u16) {
    let Some(channel) = ledc_channel_for(pin) else {
        log::warn!("ledc_set({}) on unclaimed pin", pin);
        return;
    };
    let duty = duty.min(pins::PWM_DUTY_MAX);
    // SAFETY: the channel was configured in ledc_claim(); register writes
    // are race-free because only the main loop calls this.
    unsafe {
        ledc_set_freq(
            ledc_mode_t_LEDC_LOW_SPEED_MODE,
            ledc_timer_t_LEDC_TIMER_0,
            freq_hz,
        );
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(pin: PinId, freq_hz: u32, duty: u16) {
    log::info!(
        "hw_init(sim): PWM pin {} -> freq={}Hz duty={}",
        pin,
        freq_hz,
        duty.min(pins::PWM_DUTY_MAX)
    );
}
