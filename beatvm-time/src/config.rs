use crate::{SampleRate, TransportMask};

#[derive(Debug, Clone)]
pub struct ClockConfig {
  pub sample_rate: SampleRate,
  /// Which notifications are emitted.
  pub mask: TransportMask,
  /// Report the complete position once, on the first call to `advance`.
  pub notify_initial: bool,
}

impl ClockConfig {
  pub const DEFAULT_SAMPLE_RATE: SampleRate = 44_100.0;

  pub fn new(sample_rate: SampleRate) -> Self {
    Self {
      sample_rate,
      ..Default::default()
    }
  }

  pub fn with_mask(mut self, mask: TransportMask) -> Self {
    self.mask = mask;
    self
  }

  pub fn with_initial_notifications(mut self, enabled: bool) -> Self {
    self.notify_initial = enabled;
    self
  }
}

impl Default for ClockConfig {
  fn default() -> Self {
    Self {
      sample_rate: Self::DEFAULT_SAMPLE_RATE,
      mask: TransportMask::all(),
      notify_initial: true,
    }
  }
}
