//! Static device configuration.
//!
//! Everything the bridge needs to know about its wiring and network peers
//! lives in one immutable [`Config`] value, built from compiled-in defaults
//! at startup. The only field that can be overridden at runtime is the
//! broker host, read once from a plain-text file; a missing or malformed
//! file is logged and ignored.

use std::fs;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// GPIO pin number, as ESP-IDF counts them.
pub type PinId = i32;

/// Where UDP event datagrams go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTarget {
    /// Broker host, IPv4 dotted quad or resolvable name.
    pub host: String,
    /// UDP port for digital-input transition datagrams.
    pub gpio_port: u16,
    /// UDP port for analog sample datagrams.
    pub adc_port: u16,
}

/// One interrupt-watched digital input (a wall switch, a reed contact).
///
/// Inputs are wired active-low: idle reads high through the pull-up,
/// pressed pulls the pin to ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalInputSpec {
    pub pin: PinId,
    pub name: String,
    /// Datagram payload sent when the input asserts (goes electrically low).
    pub on_payload: Vec<u8>,
    /// Datagram payload sent when the input releases (returns high).
    pub off_payload: Vec<u8>,
}

/// One HTTP-controllable output (relay, LED, or PWM-driven buzzer).
///
/// `on_path` / `off_path` double as the route keys the control endpoint
/// matches against, so they must be unique across all outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalOutputSpec {
    pub pin: PinId,
    pub name: String,
    pub on_path: String,
    pub off_path: String,
    #[serde(default)]
    pub is_pwm: bool,
}

/// Core device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device identity, used as the status page title.
    pub client_id: String,
    pub target: NetworkTarget,
    pub inputs: Vec<DigitalInputSpec>,
    pub outputs: Vec<DigitalOutputSpec>,
    /// TCP port for the control endpoint.
    pub http_port: u16,
    /// Target duration of one control-loop tick (milliseconds).
    pub tick_interval_ms: u64,
    /// Loop ticks between analog samples.
    pub adc_count_interval: u32,
    /// Minimum absolute analog change worth a datagram.
    pub adc_min_delta: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: "roomnode-bedroom".into(),
            target: NetworkTarget {
                host: "192.168.1.19".into(),
                gpio_port: 8266,
                adc_port: 8267,
            },
            inputs: vec![
                DigitalInputSpec {
                    pin: pins::SWITCH_2_GPIO,
                    name: "Switch #2".into(),
                    on_payload: vec![0x02, 0xff],
                    off_payload: vec![0x02, 0x00],
                },
                DigitalInputSpec {
                    pin: pins::SWITCH_3_GPIO,
                    name: "Switch #3".into(),
                    on_payload: vec![0x03, 0xff],
                    off_payload: vec![0x03, 0x00],
                },
                DigitalInputSpec {
                    pin: pins::SWITCH_4_GPIO,
                    name: "Switch #4".into(),
                    on_payload: vec![0x04, 0xff],
                    off_payload: vec![0x04, 0x00],
                },
            ],
            outputs: vec![
                DigitalOutputSpec {
                    pin: pins::OUTLET_GPIO,
                    name: "AC Outlet".into(),
                    on_path: "/outlet/on".into(),
                    off_path: "/outlet/off".into(),
                    is_pwm: false,
                },
                DigitalOutputSpec {
                    pin: pins::GREEN_LED_GPIO,
                    name: "Internal Green LED".into(),
                    on_path: "/led/on".into(),
                    off_path: "/led/off".into(),
                    is_pwm: false,
                },
                DigitalOutputSpec {
                    pin: pins::BUZZER_GPIO,
                    name: "Buzzer".into(),
                    on_path: "/buzzer/on".into(),
                    off_path: "/buzzer/off".into(),
                    is_pwm: true,
                },
            ],
            http_port: 80,
            tick_interval_ms: 10,
            adc_count_interval: 100,
            adc_min_delta: 5,
        }
    }
}

impl Config {
    /// Load the configuration: compiled-in defaults plus the broker-host
    /// override file, when present.
    pub fn load() -> Self {
        Self::load_from(default_override_path())
    }

    /// Same as [`load`](Self::load) with an explicit override file path.
    pub fn load_from(path: &str) -> Self {
        let mut config = Self::default();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let host = contents.trim();
                if host.is_empty() {
                    warn!(
                        "Override file {} is empty, keeping default host {}",
                        path, config.target.host
                    );
                } else {
                    info!("Broker host overridden from {}: {}", path, host);
                    config.target.host = host.to_string();
                }
            }
            Err(e) => {
                warn!(
                    "Couldn't load {} ({}), assuming default host {}",
                    path, e, config.target.host
                );
            }
        }
        config
    }

    /// Check the invariants the rest of the system relies on: input pins
    /// unique, output route paths unique.
    pub fn validate(&self) -> Result<()> {
        for (i, a) in self.inputs.iter().enumerate() {
            if self.inputs[..i].iter().any(|b| b.pin == a.pin) {
                return Err(Error::Config("duplicate input pin"));
            }
        }
        let mut paths: Vec<&str> = Vec::new();
        for out in &self.outputs {
            for path in [out.on_path.as_str(), out.off_path.as_str()] {
                if paths.contains(&path) {
                    return Err(Error::Config("duplicate output route path"));
                }
                paths.push(path);
            }
        }
        Ok(())
    }
}

fn default_override_path() -> &'static str {
    #[cfg(target_os = "espidf")]
    {
        "/spiffs/broker.ip"
    }
    #[cfg(not(target_os = "espidf"))]
    {
        "broker.ip"
    }
}
