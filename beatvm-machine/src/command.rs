use std::fmt::{Display, Formatter};

use crate::{Num, Opcode};

/// One slot of a program.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Command {
  /// Terminates the program
  #[default]
  Nop,
  Opcode(Opcode),
  Bool(bool),
  Int(i32),
  Float(f32),
}

impl Command {
  pub fn is_nop(&self) -> bool {
    matches!(self, Command::Nop)
  }

  /// Value pushed by a literal.
  pub fn value(&self) -> Option<Num> {
    match self {
      Command::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
      Command::Int(value) => Some(*value as Num),
      Command::Float(value) => Some(*value as Num),
      Command::Nop | Command::Opcode(_) => None,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Command::Nop => "",
      Command::Opcode(_) => "Operation",
      Command::Bool(_) => "Boolean",
      Command::Int(_) => "Integer",
      Command::Float(_) => "Float",
    }
  }
}

impl From<Opcode> for Command {
  fn from(opcode: Opcode) -> Self {
    Command::Opcode(opcode)
  }
}

impl From<bool> for Command {
  fn from(value: bool) -> Self {
    Command::Bool(value)
  }
}

impl From<i32> for Command {
  fn from(value: i32) -> Self {
    Command::Int(value)
  }
}

impl From<f32> for Command {
  fn from(value: f32) -> Self {
    Command::Float(value)
  }
}

impl Display for Command {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Command::Nop => Ok(()),
      Command::Opcode(opcode) => write!(f, "{}", opcode),
      Command::Bool(value) => write!(f, "{}", value),
      Command::Int(value) => write!(f, "{}", value),
      // debug formatting keeps the decimal point, so it reads back as a float
      Command::Float(value) => write!(f, "{:?}", value),
    }
  }
}
