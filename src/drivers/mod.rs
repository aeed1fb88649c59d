//! Digital I/O backends for the sensor lines.
//!
//! | Backend | Implements                     | Connects to            |
//! |---------|--------------------------------|------------------------|
//! | `gpio`  | InputPin · OutputPin · DelayNs | Linux `/dev/gpiochipN` |
//! | `sim`   | InputPin · OutputPin · DelayNs | In-memory (tests, dry) |

pub mod gpio;
pub mod sim;
