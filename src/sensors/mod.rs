//! Sensor subsystem.
//!
//! Only one sensor today: the resistive wet/dry probe. The sampler is
//! generic over the `embedded-hal` traits, so the same code runs against
//! the GPIO character device on the Pi and against [`crate::drivers::sim`] in tests.

pub mod water_probe;

pub use water_probe::{SampleTiming, SensorSampler, majority};
