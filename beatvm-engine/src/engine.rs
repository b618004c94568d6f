use ringbuf::RingBuffer;

use crate::{Controller, EngineConfig, Processor};

pub struct Engine {
  controller: Controller,
  processor: Processor,
}

impl Engine {
  pub fn new() -> Self {
    Self::with_config(EngineConfig::default())
  }

  pub fn with_config(config: EngineConfig) -> Self {
    let (program_tx, program_rx) = RingBuffer::new(config.program_queue_capacity).split();
    let (notification_tx, notification_rx) = RingBuffer::new(config.ring_buffer_capacity).split();

    log::debug!(
      "Creating engine: {:?} ports at {} Hz",
      config.port_class,
      config.clock.sample_rate
    );

    let controller = Controller::new(program_tx, notification_rx);
    let processor = Processor::new(notification_tx, program_rx, config);

    Self {
      controller,
      processor,
    }
  }

  pub fn split(self) -> (Controller, Processor) {
    let Self {
      controller,
      processor,
    } = self;
    (controller, processor)
  }
}

impl Default for Engine {
  fn default() -> Self {
    Self::new()
  }
}
