//! Port traits — the hexagonal boundary between the control loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (ESP peripherals, UDP socket, TCP listener) implement
//! these traits. The [`BridgeService`](super::service::BridgeService)
//! consumes them via generics, so the loop never touches hardware or
//! sockets directly and the whole thing runs against mocks on the host.

use std::io;

use crate::config::PinId;

// ───────────────────────────────────────────────────────────────
// Hardware port
// ───────────────────────────────────────────────────────────────

/// Register-level I/O capability: pins, ADC, PWM, watchdog.
///
/// Edge-interrupt registration is deliberately *not* part of this trait —
/// ISRs are wired once at boot by the platform init code and communicate
/// with the loop only through [`EdgeLatch`](crate::edge::EdgeLatch).
pub trait HardwareIo {
    /// Current logic level of an input pin (true = high).
    fn read_digital(&mut self, pin: PinId) -> bool;

    /// Drive an output pin (true = high).
    fn write_digital(&mut self, pin: PinId, high: bool);

    /// One-time acquisition of the output peripheral behind `pin`
    /// (GPIO direction register or an LEDC channel). Called at most once
    /// per output for the process lifetime; the caller caches the result.
    fn claim_output(&mut self, pin: PinId, pwm: bool);

    /// Reconfigure a claimed PWM output. `duty = 0` stops the carrier.
    fn set_pwm(&mut self, pin: PinId, freq_hz: u32, duty: u16);

    /// Raw reading of one ADC channel.
    fn read_analog(&mut self, channel: u32) -> u16;

    /// Reset the hardware watchdog counter. Called first thing every tick.
    fn feed_watchdog(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// Connectionless, fire-and-forget datagram transmission.
pub trait DatagramSink {
    /// Send one datagram. Errors are reported but the caller treats the
    /// payload as expendable — there is no retry protocol.
    fn send(&mut self, payload: &[u8], host: &str, port: u16) -> io::Result<()>;
}

/// Accept side of the control endpoint.
pub trait ConnectionListener {
    type Stream: io::Read + io::Write;

    /// Non-blocking accept: `None` when no client is waiting. The loop
    /// calls this at most once per tick, so a second pending client is
    /// served on a later tick.
    fn poll_accept(&mut self) -> Option<Self::Stream>;
}
