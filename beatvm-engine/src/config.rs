use beatvm_machine::MachineConfig;
use beatvm_time::ClockConfig;

use crate::PortClass;

#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub clock: ClockConfig,
  pub machine: MachineConfig,
  pub port_class: PortClass,
  /// Capacity of the notifications queue from the processor to the controller
  pub ring_buffer_capacity: usize,
  /// Capacity of the programs queue from the controller to the processor
  pub program_queue_capacity: usize,
}

impl EngineConfig {
  pub const DEFAULT_RING_BUFFER_CAPACITY: usize = 1024;
  pub const DEFAULT_PROGRAM_QUEUE_CAPACITY: usize = 4;

  pub fn with_clock(mut self, clock: ClockConfig) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_machine(mut self, machine: MachineConfig) -> Self {
    self.machine = machine;
    self
  }

  pub fn with_port_class(mut self, port_class: PortClass) -> Self {
    self.port_class = port_class;
    self
  }

  pub fn with_ring_buffer_capacity(mut self, capacity: usize) -> Self {
    self.ring_buffer_capacity = capacity;
    self
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      clock: ClockConfig::default(),
      machine: MachineConfig::default(),
      port_class: PortClass::default(),
      ring_buffer_capacity: Self::DEFAULT_RING_BUFFER_CAPACITY,
      program_queue_capacity: Self::DEFAULT_PROGRAM_QUEUE_CAPACITY,
    }
  }
}
