use crate::Num;

pub const SLOT_MAX: usize = 0x20;
const SLOT_MASK: usize = SLOT_MAX - 1;

pub const REG_MAX: usize = 0x20;
const REG_MASK: usize = REG_MAX - 1;

/// Fixed capacity ring of values plus a register bank.
///
/// Pushing moves the head down and popping moves it up, both wrapping around the capacity,
/// so the stack never fails: popping more than was pushed reads stale or zeroed slots.
#[derive(Debug, Clone)]
pub struct Stack {
  slots: [Num; SLOT_MAX],
  regs: [Num; REG_MAX],
  ptr: usize,
}

impl Stack {
  pub fn new() -> Self {
    Self {
      slots: [0.0; SLOT_MAX],
      regs: [0.0; REG_MAX],
      ptr: 0,
    }
  }

  /// Zero the slots and reset the head. Registers are kept.
  pub fn clear(&mut self) {
    self.slots = [0.0; SLOT_MAX];
    self.ptr = 0;
  }

  pub fn clear_registers(&mut self) {
    self.regs = [0.0; REG_MAX];
  }

  #[inline]
  pub fn push(&mut self, value: Num) {
    self.ptr = self.ptr.wrapping_sub(1) & SLOT_MASK;
    self.slots[self.ptr] = value;
  }

  #[inline]
  pub fn pop(&mut self) -> Num {
    let value = self.slots[self.ptr];
    self.ptr = (self.ptr + 1) & SLOT_MASK;
    value
  }

  #[inline]
  pub fn peek(&self) -> Num {
    self.slots[self.ptr]
  }

  /// Push the values in order, the last one ends up on top.
  #[inline]
  pub fn push_n<const N: usize>(&mut self, values: [Num; N]) {
    for value in values {
      self.push(value);
    }
  }

  /// Pop `N` values, returned deepest first.
  #[inline]
  pub fn pop_n<const N: usize>(&mut self) -> [Num; N] {
    let mut values = [0.0; N];
    for value in values.iter_mut().rev() {
      *value = self.pop();
    }
    values
  }

  #[inline]
  pub fn store(&mut self, index: Num, value: Num) {
    self.regs[mask_index(index, REG_MASK)] = value;
  }

  #[inline]
  pub fn load(&self, index: Num) -> Num {
    self.regs[mask_index(index, REG_MASK)]
  }

  pub fn registers(&self) -> &[Num; REG_MAX] {
    &self.regs
  }

  /// Position of the head within the ring.
  pub fn head(&self) -> usize {
    self.ptr
  }
}

impl Default for Stack {
  fn default() -> Self {
    Self::new()
  }
}

/// `floor(index)` wrapped into `[0, mask]`.
#[inline]
pub(crate) fn mask_index(index: Num, mask: usize) -> usize {
  use num_traits::ToPrimitive;

  let index = index.floor().to_i64().unwrap_or(0);
  (index as usize) & mask
}
