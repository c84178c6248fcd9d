//! Unified error types for the RoomNode firmware.
//!
//! One `Error` enum every subsystem converts into, keeping the control
//! loop's error handling uniform. The split matters operationally:
//! configuration and network problems are recovered locally and logged,
//! while the `Unknown*` variants mark internal-consistency violations
//! (a name that never came from the validated config) and are allowed
//! to take the process down.

use std::fmt;
use std::io;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration violates a load-time invariant.
    Config(&'static str),
    /// Socket setup (bind/listen) failed.
    Net(io::Error),
    /// An actuator command named an output absent from the configuration.
    UnknownOutput(String),
    /// A notification named an input absent from the configuration.
    UnknownInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Net(e) => write!(f, "net: {e}"),
            Self::UnknownOutput(name) => write!(f, "unknown output '{name}'"),
            Self::UnknownInput(name) => write!(f, "unknown input '{name}'"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Net(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
