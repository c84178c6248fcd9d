//! Application core — pure control-loop logic, zero I/O.
//!
//! The bridge's scheduling and event semantics live here. All interaction
//! with pins, sockets, and the watchdog happens through the **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals or a network.

pub mod ports;
pub mod service;
