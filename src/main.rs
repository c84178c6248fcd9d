//! RoomNode Firmware — Main Entry Point
//!
//! Hexagonal wiring around a single-threaded cooperative loop:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  EspHardwareIo      UdpNotifier      ControlListener     │
//! │  (HardwareIo)       (DatagramSink)   (ConnectionListener)│
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ──────────────      │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │            BridgeService (pure logic)          │      │
//! │  │  watchdog · sampler · edge diff · HTTP serve   │      │
//! │  └────────────────────────────────────────────────┘      │
//! │                                                          │
//! │  GPIO ISRs ──▶ EdgeLatch (the only cross-context state)  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use anyhow::Result;
use log::info;

use roomnode::adapters::hardware::EspHardwareIo;
use roomnode::adapters::net::{ControlListener, UdpNotifier};
use roomnode::app::service::BridgeService;
use roomnode::config::Config;
use roomnode::drivers::hw_init;
use roomnode::drivers::watchdog::Watchdog;
use roomnode::edge;

/// Hard-reset trigger when the loop stalls this long without a feed.
const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::init();

    info!("RoomNode v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration (defaults + broker override) ─────────
    let config = Config::load();
    config.validate()?;
    info!(
        "Bridging {} inputs / {} outputs to {} (gpio:{} adc:{})",
        config.inputs.len(),
        config.outputs.len(),
        config.target.host,
        config.target.gpio_port,
        config.target.adc_port
    );

    // ── 3. Peripherals + edge interrupts ──────────────────────
    hw_init::init_peripherals(&config)?;
    hw_init::init_isr_service(&config)?;
    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);
    let mut hw = EspHardwareIo::new(watchdog);

    // ── 4. Network adapters ───────────────────────────────────
    let mut udp = UdpNotifier::bind()?;
    let mut listener = ControlListener::bind(config.http_port)?;

    // ── 5. Event loop ─────────────────────────────────────────
    let tick = Duration::from_millis(config.tick_interval_ms);
    let mut service = BridgeService::new(config, &edge::EDGE_EVENTS);

    info!("System ready. Entering control loop.");
    loop {
        // Fatal errors here mean the runtime state diverged from the
        // validated config — better to restart than limp on.
        service.tick(&mut hw, &mut udp, &mut listener)?;
        // Accept is non-blocking, so the sleep alone paces the loop and
        // bounds every tick well under the watchdog timeout.
        std::thread::sleep(tick);
    }
}
