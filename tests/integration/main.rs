//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the control loop
//! against mock adapters. All tests run on the host (x86_64) with no
//! real hardware or network required.

mod control_loop_tests;
mod http_endpoint_tests;
