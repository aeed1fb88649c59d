//! GPIO line assignments and sensor timing for the Raspberry Pi header.
//!
//! Single source of truth for the defaults. Every driver and the config
//! layer reference this module rather than hard-coding numbers; the
//! environment can still override the pins at startup.
//!
//! Numbers are BCM (Broadcom) line numbers, not physical header pins.

use core::time::Duration;

// ---------------------------------------------------------------------------
// Wet/dry probe
// ---------------------------------------------------------------------------

/// Digital input: probe signal. HIGH = water bridging the contacts.
/// Configured with a pull-down so a floating probe reads dry.
pub const SENSOR_GPIO: u32 = 17;

/// Digital output: probe excitation. Only HIGH while sampling, to limit
/// electrolytic corrosion of the contacts.
pub const SENSOR_POWER_GPIO: u32 = 27;

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Raw reads per debounced sample. Odd, so a strict majority always exists.
pub const SAMPLE_COUNT: usize = 5;

/// Settle time after energizing the probe before the first read.
pub const SENSOR_STABILIZE: Duration = Duration::from_millis(100);

/// Gap between consecutive raw reads.
pub const SAMPLE_SPACING: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Linux GPIO
// ---------------------------------------------------------------------------

/// GPIO character device carrying the 40-pin header. Line offsets on it
/// are BCM numbers.
pub const GPIO_CHIP: &str = "/dev/gpiochip0";
