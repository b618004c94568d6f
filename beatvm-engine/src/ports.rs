/// Kind of host ports the inputs and outputs are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortClass {
  /// One value per block
  #[default]
  Control,
  /// Control voltage, one value per sample
  Cv,
  /// Raw audio, one value per sample and never clipped
  Audio,
}

impl PortClass {
  pub const MIN: f32 = -1.0;
  pub const MAX: f32 = 1.0;

  pub fn is_per_sample(&self) -> bool {
    matches!(self, PortClass::Cv | PortClass::Audio)
  }

  pub fn clip(&self, value: f32) -> f32 {
    match self {
      PortClass::Audio => value,
      PortClass::Control | PortClass::Cv => value.clamp(Self::MIN, Self::MAX),
    }
  }
}
