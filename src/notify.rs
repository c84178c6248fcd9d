//! UDP notification dispatch.
//!
//! Formats and sends the two kinds of event datagrams: input-edge reports
//! to `gpio_port` and analog readings to `adc_port`. Both are
//! fire-and-forget — a failed send is logged and forgotten, never queued.

use log::{info, warn};

use crate::app::ports::DatagramSink;
use crate::config::{DigitalInputSpec, NetworkTarget};
use crate::error::{Error, Result};

/// Owns the network target and the input table needed to pick payloads.
pub struct NotificationDispatcher {
    target: NetworkTarget,
    inputs: Vec<DigitalInputSpec>,
}

impl NotificationDispatcher {
    pub fn new(target: NetworkTarget, inputs: Vec<DigitalInputSpec>) -> Self {
        Self { target, inputs }
    }

    /// Report a digital-input transition.
    ///
    /// Inputs are wired active-low, so the *on* payload goes out when the
    /// new electrical level is low and the *off* payload when it is high.
    /// An unknown name means the caller's state diverged from the
    /// validated config — that is a fatal consistency error, not a
    /// droppable datagram.
    pub fn notify_digital(
        &self,
        sink: &mut impl DatagramSink,
        name: &str,
        new_level: bool,
    ) -> Result<()> {
        let spec = self
            .inputs
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::UnknownInput(name.to_owned()))?;

        let payload = if new_level {
            &spec.off_payload
        } else {
            &spec.on_payload
        };

        match sink.send(payload, &self.target.host, self.target.gpio_port) {
            Ok(()) => info!(
                "Sent datagram to {}:{}: {:02x?}",
                self.target.host, self.target.gpio_port, payload
            ),
            Err(e) => warn!("Edge datagram for '{}' dropped: {}", name, e),
        }
        Ok(())
    }

    /// Report an analog sample as its decimal text representation.
    pub fn notify_analog(&self, sink: &mut impl DatagramSink, value: i32) {
        let text = value.to_string();
        match sink.send(text.as_bytes(), &self.target.host, self.target.adc_port) {
            Ok(()) => info!(
                "Sent datagram to {}:{}: {}",
                self.target.host, self.target.adc_port, text
            ),
            Err(e) => warn!("Analog datagram dropped: {}", e),
        }
    }
}
