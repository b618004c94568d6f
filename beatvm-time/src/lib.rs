mod clock;
mod config;
mod position;

pub use crate::clock::Clock;
pub use crate::config::ClockConfig;
pub use crate::position::{TransportField, TransportMask, TransportPosition, TransportUpdate};

pub type SampleRate = f64;
