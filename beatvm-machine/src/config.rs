#[derive(Debug, Clone)]
pub struct MachineConfig {
  /// Seed for the `rand` opcode. Taken from the system entropy when missing.
  pub seed: Option<u64>,
  /// Maximum number of commands dispatched per execution.
  pub max_steps: usize,
}

impl MachineConfig {
  pub const DEFAULT_MAX_STEPS: usize = 4096;

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  pub fn with_max_steps(mut self, max_steps: usize) -> Self {
    self.max_steps = max_steps;
    self
  }
}

impl Default for MachineConfig {
  fn default() -> Self {
    Self {
      seed: None,
      max_steps: Self::DEFAULT_MAX_STEPS,
    }
  }
}
