//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host with no real hardware
//! and no internet access required.

mod http_stub;
mod mock_ports;
mod monitor_tests;
mod scenario_tests;
