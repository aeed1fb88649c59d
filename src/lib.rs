//! Waterwatch library.
//!
//! Exposes the monitor core, its adapters and the GPIO backends for the
//! binary and for integration testing. Everything runs on the host; the
//! simulated GPIO backend in [`drivers::sim`] stands in for the Pi.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod shutdown;
