//! Linux GPIO character-device backend.
//!
//! Lines are requested by offset on a `/dev/gpiochipN` device. On the
//! Raspberry Pi header chip the offset is the BCM number, whatever global
//! number the kernel assigns the line. Pins are `linux-embedded-hal`
//! [`CdevPin`]s, so the sampler sees the plain `embedded-hal` traits.
//!
//! The v1 line-request API cannot configure pull resistors; the probe input
//! needs its pull-down set in firmware config, e.g. `gpio=17=ip,pd` in
//! `/boot/firmware/config.txt`.

use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorType, OutputPin};
use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, CdevPinError};
use log::{debug, warn};

pub use linux_embedded_hal::Delay;

/// Consumer label shown by `gpioinfo` for the requested lines.
const CONSUMER: &str = "waterwatch";

/// Failure to request a line from a chip.
#[derive(Debug)]
pub struct GpioError {
    pub chip: PathBuf,
    pub line: u32,
    pub source: gpio_cdev::errors::Error,
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} line {}: {}", self.chip.display(), self.line, self.source)
    }
}

impl std::error::Error for GpioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// One GPIO character device.
#[derive(Debug, Clone)]
pub struct GpioChip {
    path: PathBuf,
}

impl GpioChip {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Request `line` as an input.
    pub fn input(&self, line: u32) -> Result<CdevPin, GpioError> {
        let pin = self.request(line, LineRequestFlags::INPUT, 0)?;
        debug!("gpio: line {line} configured as input");
        Ok(pin)
    }

    /// Request `line` as an output, initially low.
    pub fn output(&self, line: u32) -> Result<PowerLine, GpioError> {
        let pin = self.request(line, LineRequestFlags::OUTPUT, 0)?;
        debug!("gpio: line {line} configured as output (low)");
        Ok(PowerLine { pin, line })
    }

    fn request(&self, line: u32, flags: LineRequestFlags, level: u8) -> Result<CdevPin, GpioError> {
        let err = |source| GpioError {
            chip: self.path.clone(),
            line,
            source,
        };
        let mut chip = Chip::new(&self.path).map_err(err)?;
        let handle = chip
            .get_line(line)
            .map_err(err)?
            .request(flags, level, CONSUMER)
            .map_err(err)?;
        CdevPin::new(handle).map_err(err)
    }
}

// ── Output ────────────────────────────────────────────────────

/// Output line that is driven low before it is released.
pub struct PowerLine {
    pin: CdevPin,
    line: u32,
}

impl ErrorType for PowerLine {
    type Error = CdevPinError;
}

impl OutputPin for PowerLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl Drop for PowerLine {
    fn drop(&mut self) {
        if let Err(e) = self.pin.set_low() {
            warn!("gpio: failed to drive line {} low on release: {e:?}", self.line);
        }
    }
}
