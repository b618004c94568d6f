mod config;
mod controller;
mod engine;
mod error;
mod events;
mod messages;
mod ports;
mod processor;

pub use crate::config::EngineConfig;
pub use crate::controller::Controller;
pub use crate::engine::Engine;
pub use crate::error::{Error, Result};
pub use crate::events::{EventsBuffer, TransportEvent, EVENTS_MAX};
pub use crate::messages::Notification;
pub use crate::ports::PortClass;
pub use crate::processor::{ProcessContext, Processor};

pub use beatvm_machine as machine;
pub use beatvm_time as time;
