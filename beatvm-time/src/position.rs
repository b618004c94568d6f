use bitflags::bitflags;

use crate::SampleRate;

bitflags! {
  pub struct TransportMask: u16 {
    const BAR_BEAT = 1 << 0;
    const BAR = 1 << 1;
    const BEAT_UNIT = 1 << 2;
    const BEATS_PER_BAR = 1 << 3;
    const BEATS_PER_MINUTE = 1 << 4;
    const FRAME = 1 << 5;
    const FRAMES_PER_SECOND = 1 << 6;
    const SPEED = 1 << 7;
    /// Bar-beat changes synthesized at beat boundaries while rolling
    const BAR_BEAT_WHOLE = 1 << 8;
    /// Bar changes synthesized at bar boundaries while rolling
    const BAR_WHOLE = 1 << 9;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportField {
  BarBeat,
  Bar,
  BeatUnit,
  BeatsPerBar,
  BeatsPerMinute,
  Frame,
  FramesPerSecond,
  Speed,
}

impl TransportField {
  pub fn mask(&self) -> TransportMask {
    match self {
      TransportField::BarBeat => TransportMask::BAR_BEAT,
      TransportField::Bar => TransportMask::BAR,
      TransportField::BeatUnit => TransportMask::BEAT_UNIT,
      TransportField::BeatsPerBar => TransportMask::BEATS_PER_BAR,
      TransportField::BeatsPerMinute => TransportMask::BEATS_PER_MINUTE,
      TransportField::Frame => TransportMask::FRAME,
      TransportField::FramesPerSecond => TransportMask::FRAMES_PER_SECOND,
      TransportField::Speed => TransportMask::SPEED,
    }
  }
}

/// A snapshot of the transport position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportPosition {
  /// Fractional beat within the bar, in `[0, beats_per_bar)`
  pub bar_beat: f64,
  pub bar: i64,
  pub beat_unit: i32,
  pub beats_per_bar: f64,
  pub beats_per_minute: f64,
  pub frame: i64,
  pub frames_per_second: SampleRate,
  /// `0` means stopped
  pub speed: f64,
}

impl TransportPosition {
  pub const DEFAULT_BEAT_UNIT: i32 = 4;
  pub const DEFAULT_BEATS_PER_BAR: f64 = 4.0;
  pub const DEFAULT_BEATS_PER_MINUTE: f64 = 120.0;

  pub fn new(frames_per_second: SampleRate) -> Self {
    Self {
      bar_beat: 0.0,
      bar: 0,
      beat_unit: Self::DEFAULT_BEAT_UNIT,
      beats_per_bar: Self::DEFAULT_BEATS_PER_BAR,
      beats_per_minute: Self::DEFAULT_BEATS_PER_MINUTE,
      frame: 0,
      frames_per_second,
      speed: 0.0,
    }
  }

  pub fn is_rolling(&self) -> bool {
    self.speed > 0.0
  }

  pub fn value(&self, field: TransportField) -> f64 {
    match field {
      TransportField::BarBeat => self.bar_beat,
      TransportField::Bar => self.bar as f64,
      TransportField::BeatUnit => self.beat_unit as f64,
      TransportField::BeatsPerBar => self.beats_per_bar,
      TransportField::BeatsPerMinute => self.beats_per_minute,
      TransportField::Frame => self.frame as f64,
      TransportField::FramesPerSecond => self.frames_per_second,
      TransportField::Speed => self.speed,
    }
  }
}

/// A sparse transport position change, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportUpdate {
  pub bar_beat: Option<f64>,
  pub bar: Option<i64>,
  pub beat_unit: Option<i32>,
  pub beats_per_bar: Option<f64>,
  pub beats_per_minute: Option<f64>,
  pub frame: Option<i64>,
  pub frames_per_second: Option<SampleRate>,
  pub speed: Option<f64>,
}

impl TransportUpdate {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_bar_beat(mut self, bar_beat: f64) -> Self {
    self.bar_beat = Some(bar_beat);
    self
  }

  pub fn with_bar(mut self, bar: i64) -> Self {
    self.bar = Some(bar);
    self
  }

  pub fn with_beat_unit(mut self, beat_unit: i32) -> Self {
    self.beat_unit = Some(beat_unit);
    self
  }

  pub fn with_beats_per_bar(mut self, beats_per_bar: f64) -> Self {
    self.beats_per_bar = Some(beats_per_bar);
    self
  }

  pub fn with_beats_per_minute(mut self, beats_per_minute: f64) -> Self {
    self.beats_per_minute = Some(beats_per_minute);
    self
  }

  pub fn with_frame(mut self, frame: i64) -> Self {
    self.frame = Some(frame);
    self
  }

  pub fn with_frames_per_second(mut self, frames_per_second: SampleRate) -> Self {
    self.frames_per_second = Some(frames_per_second);
    self
  }

  pub fn with_speed(mut self, speed: f64) -> Self {
    self.speed = Some(speed);
    self
  }

  pub fn is_empty(&self) -> bool {
    self == &Self::default()
  }
}
