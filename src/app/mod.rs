//! Application core: the monitoring decision loop.
//!
//! Debounced readings go through the notification policy in
//! [`evaluator`] and the actuation window in [`crate::scheduler`]; the
//! [`service`] ties them together. All interaction with the network and
//! the filesystem happens through **port traits** defined in [`ports`],
//! keeping this layer testable with mock adapters.

pub mod evaluator;
pub mod events;
pub mod messages;
pub mod ports;
pub mod service;
