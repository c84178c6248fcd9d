//! Network adapters: UDP notification socket and the TCP control listener.
//!
//! Both sit on `std::net`, which on ESP-IDF is backed by lwIP and behaves
//! the same as on the host — so these adapters are *not* cfg-gated.

use std::io;
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{ConnectionListener, DatagramSink};

/// Per-client socket timeout — generous next to the loop tick so slow
/// clients still get their page, but bounded so one stalled peer cannot
/// starve the watchdog.
const CLIENT_IO_TIMEOUT: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// UDP notifier
// ───────────────────────────────────────────────────────────────

/// One ephemeral-port UDP socket reused for every outbound datagram.
pub struct UdpNotifier {
    socket: UdpSocket,
}

impl UdpNotifier {
    pub fn bind() -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        Ok(Self { socket })
    }
}

impl DatagramSink for UdpNotifier {
    fn send(&mut self, payload: &[u8], host: &str, port: u16) -> io::Result<()> {
        self.socket.send_to(payload, (host, port))?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Control listener
// ───────────────────────────────────────────────────────────────

/// Non-blocking TCP listener for the control endpoint. `poll_accept`
/// returns immediately; the main loop's tick sleep paces the polling.
pub struct ControlListener {
    listener: TcpListener,
}

impl ControlListener {
    pub fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        info!("Control endpoint listening on 0.0.0.0:{}", port);
        Ok(Self { listener })
    }
}

impl ConnectionListener for ControlListener {
    type Stream = TcpStream;

    fn poll_accept(&mut self) -> Option<TcpStream> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                info!("Accepted control connection from {}", peer);
                // The listener is non-blocking but the accepted stream
                // must not be — reads use the bounded timeout instead.
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!("Couldn't switch client socket to blocking: {}", e);
                    return None;
                }
                stream.set_read_timeout(Some(CLIENT_IO_TIMEOUT)).ok();
                stream.set_write_timeout(Some(CLIENT_IO_TIMEOUT)).ok();
                Some(stream)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("Accept failed: {}", e);
                None
            }
        }
    }
}
