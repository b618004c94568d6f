use crate::{ClockConfig, SampleRate, TransportField, TransportMask, TransportPosition, TransportUpdate};

/// Order in which the complete position is reported on the first advance.
const INITIAL_FIELDS: [TransportField; 8] = [
  TransportField::Speed,
  TransportField::BeatUnit,
  TransportField::BeatsPerBar,
  TransportField::BeatsPerMinute,
  TransportField::Frame,
  TransportField::FramesPerSecond,
  TransportField::Bar,
  TransportField::BarBeat,
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Span {
  beat: f64,
  bar: f64,
}

/// Tracks the host transport and synthesizes bar and beat changes between explicit updates.
///
/// The clock is advanced through consecutive spans of a processing block. While rolling,
/// every sample of the span is walked and boundary notifications are emitted at the sample
/// where the accumulated frames reach the beat (or bar) window. Offsets are incremented
/// before they are compared, so a span of exactly one beat starting on a boundary reports
/// the next beat at its last sample.
#[derive(Debug, Clone)]
pub struct Clock {
  mask: TransportMask,
  notify_initial: bool,
  position: TransportPosition,
  frames_per_beat: f64,
  frames_per_bar: f64,
  offset: Span,
  window: Span,
  first: bool,
  rolling: bool,
}

impl Clock {
  pub fn new(config: ClockConfig) -> Self {
    let mut clock = Self {
      mask: config.mask,
      notify_initial: config.notify_initial,
      position: TransportPosition::new(config.sample_rate),
      frames_per_beat: 0.0,
      frames_per_bar: 0.0,
      offset: Span::default(),
      window: Span::default(),
      first: true,
      rolling: false,
    };
    clock.refresh(0.0);
    clock
  }

  pub fn with_sample_rate(sample_rate: SampleRate) -> Self {
    Self::new(ClockConfig::new(sample_rate))
  }

  /// Advance the clock over the frames `[from, to)` of the current block, then apply
  /// the transport update anchored at `to`, if any.
  ///
  /// Notifications are delivered to `notify` in order as `(frames, field, position)`.
  /// Returns whether a transport update was handled.
  pub fn advance<N>(
    &mut self,
    update: Option<&TransportUpdate>,
    from: u32,
    to: u32,
    mut notify: N,
  ) -> bool
  where
    N: FnMut(u32, TransportField, &TransportPosition),
  {
    debug_assert!(from <= to, "invalid span [{}, {})", from, to);

    if self.first {
      self.first = false;
      if self.notify_initial {
        for field in INITIAL_FIELDS {
          self.emit(0, field, &mut notify);
        }
      }
    }

    if self.position.is_rolling() {
      self.roll(from, to, &mut notify);
    } else {
      self.rolling = false;
    }

    match update {
      Some(update) => {
        let bar_beat = self.bar_beat();
        self.apply(update, to, &mut notify);
        let bar_beat = match update.bar_beat {
          Some(_) => self.position.bar_beat,
          None => bar_beat,
        };
        self.refresh(bar_beat);
        true
      }
      None => false,
    }
  }

  fn roll<N>(&mut self, from: u32, to: u32, notify: &mut N)
  where
    N: FnMut(u32, TransportField, &TransportPosition),
  {
    if from == to {
      return;
    }

    if !self.rolling {
      self.rolling = true;

      if self.offset.bar == 0.0 && self.position.bar == 0 {
        self.emit_with(from, TransportField::Bar, TransportMask::BAR | TransportMask::BAR_WHOLE, notify);
      }

      if self.offset.beat == 0.0 && self.position.bar_beat == 0.0 {
        self.emit_with(
          from,
          TransportField::BarBeat,
          TransportMask::BAR_BEAT | TransportMask::BAR_BEAT_WHOLE,
          notify,
        );
      }
    }

    for frames in from..to {
      self.offset.bar += 1.0;
      self.offset.beat += 1.0;

      let bar_crossed = self.offset.bar >= self.window.bar;
      if bar_crossed {
        self.position.bar += 1;
        self.offset.bar -= self.window.bar;
      }

      let beat_crossed = self.offset.beat >= self.window.beat;
      if beat_crossed {
        self.position.bar_beat = wrap(self.position.bar_beat.floor() + 1.0, self.position.beats_per_bar);
        self.offset.beat -= self.window.beat;
      }

      if bar_crossed || beat_crossed {
        let position = TransportPosition {
          frame: self.position.frame + (frames - from) as i64,
          ..self.position
        };

        if self.mask.contains(TransportMask::FRAME) {
          notify(frames, TransportField::Frame, &position);
        }
        if bar_crossed && self.mask.contains(TransportMask::BAR_WHOLE) {
          notify(frames, TransportField::Bar, &position);
        }
        if beat_crossed && self.mask.contains(TransportMask::BAR_BEAT_WHOLE) {
          notify(frames, TransportField::BarBeat, &position);
        }
      }
    }

    self.position.frame += (to - from) as i64;
  }

  fn apply<N>(&mut self, update: &TransportUpdate, frames: u32, notify: &mut N)
  where
    N: FnMut(u32, TransportField, &TransportPosition),
  {
    // a stop is reported before anything else changes
    if let Some(speed) = update.speed {
      if speed != self.position.speed && speed == 0.0 {
        self.position.speed = speed;
        self.emit(frames, TransportField::Speed, notify);
      }
    }

    if replace(update.beat_unit, &mut self.position.beat_unit) {
      self.emit(frames, TransportField::BeatUnit, notify);
    }
    if replace(update.beats_per_bar, &mut self.position.beats_per_bar) {
      self.emit(frames, TransportField::BeatsPerBar, notify);
    }
    if replace(update.beats_per_minute, &mut self.position.beats_per_minute) {
      self.emit(frames, TransportField::BeatsPerMinute, notify);
    }
    if replace(update.frame, &mut self.position.frame) {
      self.emit(frames, TransportField::Frame, notify);
    }
    if replace(update.frames_per_second, &mut self.position.frames_per_second) {
      self.emit(frames, TransportField::FramesPerSecond, notify);
    }
    if replace(update.bar, &mut self.position.bar) {
      self.emit(frames, TransportField::Bar, notify);
    }
    if replace(update.bar_beat, &mut self.position.bar_beat) {
      self.emit(frames, TransportField::BarBeat, notify);
    }

    // a start is reported once everything else is current
    if replace(update.speed, &mut self.position.speed) {
      self.emit(frames, TransportField::Speed, notify);
    }

    if !self.position.is_rolling() {
      self.rolling = false;
    }
  }

  /// Recompute the windows from tempo and meter, placing the offsets at `bar_beat`.
  fn refresh(&mut self, bar_beat: f64) {
    debug_assert!(
      self.position.beats_per_minute != 0.0 && self.position.beat_unit != 0,
      "zero tempo or beat unit"
    );

    self.frames_per_beat = 240.0
      / (self.position.beats_per_minute * self.position.beat_unit as f64)
      * self.position.frames_per_second;
    self.frames_per_bar = self.frames_per_beat * self.position.beats_per_bar;

    // a shorter meter may leave the current beat past the end of the bar
    let bar_beat = wrap(bar_beat, self.position.beats_per_bar);
    self.position.bar_beat = wrap(self.position.bar_beat, self.position.beats_per_bar);

    self.window.bar = self.frames_per_bar;
    self.offset.bar = bar_beat * self.frames_per_beat;

    self.window.beat = self.frames_per_beat;
    self.offset.beat = bar_beat.fract() * self.frames_per_beat;
  }

  fn emit<N>(&self, frames: u32, field: TransportField, notify: &mut N)
  where
    N: FnMut(u32, TransportField, &TransportPosition),
  {
    self.emit_with(frames, field, field.mask(), notify)
  }

  fn emit_with<N>(&self, frames: u32, field: TransportField, mask: TransportMask, notify: &mut N)
  where
    N: FnMut(u32, TransportField, &TransportPosition),
  {
    if self.mask.intersects(mask) {
      notify(frames, field, &self.position);
    }
  }

  pub fn position(&self) -> &TransportPosition {
    &self.position
  }

  /// Bar-beat interpolated with the frames elapsed since the last beat.
  pub fn bar_beat(&self) -> f64 {
    self.position.bar_beat.floor() + self.offset.beat / self.frames_per_beat
  }

  /// Bar-beat as last reported or synthesized.
  pub fn bar_beat_raw(&self) -> f64 {
    self.position.bar_beat
  }

  pub fn bar(&self) -> i64 {
    self.position.bar
  }

  /// Absolute beat since the first bar.
  pub fn beat(&self) -> f64 {
    self.position.bar as f64 * self.position.beats_per_bar + self.bar_beat()
  }

  pub fn beat_unit(&self) -> i32 {
    self.position.beat_unit
  }

  pub fn beats_per_bar(&self) -> f64 {
    self.position.beats_per_bar
  }

  pub fn beats_per_minute(&self) -> f64 {
    self.position.beats_per_minute
  }

  pub fn frame(&self) -> i64 {
    self.position.frame
  }

  pub fn frames_per_second(&self) -> SampleRate {
    self.position.frames_per_second
  }

  pub fn speed(&self) -> f64 {
    self.position.speed
  }

  pub fn is_rolling(&self) -> bool {
    self.position.is_rolling()
  }

  pub fn frames_per_beat(&self) -> f64 {
    self.frames_per_beat
  }

  pub fn frames_per_bar(&self) -> f64 {
    self.frames_per_bar
  }
}

/// Bring a bar-beat back into `[0, beats_per_bar)`.
fn wrap(bar_beat: f64, beats_per_bar: f64) -> f64 {
  if beats_per_bar > 0.0 {
    bar_beat.rem_euclid(beats_per_bar)
  } else {
    bar_beat
  }
}

fn replace<T: PartialEq + Copy>(value: Option<T>, current: &mut T) -> bool {
  match value {
    Some(value) if value != *current => {
      *current = value;
      true
    }
    _ => false,
  }
}
