use heapless::consts::U64;
use heapless::Vec;

use beatvm_time::TransportUpdate;

pub const EVENTS_MAX: usize = 64;

/// A transport update anchored at a frame offset of the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportEvent {
  pub frames: u32,
  pub update: TransportUpdate,
}

impl TransportEvent {
  pub fn new(frames: u32, update: TransportUpdate) -> Self {
    Self { frames, update }
  }
}

/// Fixed capacity buffer of the transport events of one block.
pub struct EventsBuffer {
  data: Vec<TransportEvent, U64>,
  sorted: bool,
}

impl EventsBuffer {
  pub fn new() -> Self {
    Self {
      data: Vec::new(),
      sorted: true,
    }
  }

  pub fn capacity(&self) -> usize {
    self.data.capacity()
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Whether the events were pushed in increasing frame order.
  pub fn is_sorted(&self) -> bool {
    self.sorted
  }

  pub fn clear(&mut self) {
    self.data.clear();
    self.sorted = true;
  }

  pub fn push(&mut self, event: TransportEvent) -> Result<(), TransportEvent> {
    let sorted = self
      .data
      .last()
      .map_or(true, |last_event| event.frames >= last_event.frames);
    self.data.push(event)?;
    self.sorted &= sorted;
    Ok(())
  }

  /// Sort by frame, keeping the order of events at the same frame.
  pub fn sort(&mut self) {
    if !self.sorted {
      // insertion sort, stable and allocation free
      for i in 1..self.data.len() {
        let mut j = i;
        while j > 0 && self.data[j - 1].frames > self.data[j].frames {
          self.data.swap(j - 1, j);
          j -= 1;
        }
      }
      self.sorted = true;
    }
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter(self.data.iter())
  }
}

impl Default for EventsBuffer {
  fn default() -> Self {
    Self::new()
  }
}

pub struct Iter<'a>(std::slice::Iter<'a, TransportEvent>);

impl<'a> Iterator for Iter<'a> {
  type Item = &'a TransportEvent;

  fn next(&mut self) -> Option<Self::Item> {
    self.0.next()
  }
}
