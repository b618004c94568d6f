use std::fmt::{Display, Formatter};
use std::ops::Index;
use std::str::FromStr;

use bitflags::bitflags;

use crate::asm;
use crate::{Command, Error, Opcode};

pub const ITEMS_MAX: usize = 128;
pub(crate) const ITEMS_MASK: usize = ITEMS_MAX - 1;

bitflags! {
  /// Whether a program can change its outputs without its inputs changing.
  #[derive(Default)]
  pub struct Status: u8 {
    const HAS_TIME = 1 << 1;
    const HAS_RAND = 1 << 2;
  }
}

impl Status {
  pub const STATIC: Status = Status::empty();

  pub fn is_dynamic(&self) -> bool {
    !self.is_empty()
  }

  fn of(command: &Command) -> Status {
    match command {
      Command::Opcode(opcode) if opcode.is_transport() => Status::HAS_TIME,
      Command::Opcode(Opcode::Rand) => Status::HAS_RAND,
      _ => Status::STATIC,
    }
  }
}

/// A fixed size sequence of commands, executed in order up to the first `Command::Nop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program {
  commands: [Command; ITEMS_MAX],
  status: Status,
}

impl Program {
  pub fn new() -> Self {
    Self {
      commands: [Command::Nop; ITEMS_MAX],
      status: Status::STATIC,
    }
  }

  /// Build a program from the first `ITEMS_MAX` commands up to the first `Command::Nop`,
  /// the rest are ignored.
  pub fn from_commands<I>(commands: I) -> Self
  where
    I: IntoIterator<Item = Command>,
  {
    let mut program = Self::new();
    let commands = commands.into_iter().take_while(|command| !command.is_nop());
    for (slot, command) in program.commands.iter_mut().zip(commands) {
      program.status |= Status::of(&command);
      *slot = command;
    }
    program
  }

  pub fn commands(&self) -> &[Command; ITEMS_MAX] {
    &self.commands
  }

  pub fn status(&self) -> Status {
    self.status
  }

  /// Number of commands before the terminator.
  pub fn len(&self) -> usize {
    self
      .commands
      .iter()
      .position(Command::is_nop)
      .unwrap_or(ITEMS_MAX)
  }

  pub fn is_empty(&self) -> bool {
    self.commands[0].is_nop()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Command> {
    self.commands.iter().take_while(|command| !command.is_nop())
  }
}

impl Default for Program {
  fn default() -> Self {
    Self::new()
  }
}

impl Index<usize> for Program {
  type Output = Command;

  fn index(&self, index: usize) -> &Self::Output {
    &self.commands[index & ITEMS_MASK]
  }
}

impl FromIterator<Command> for Program {
  fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
    Self::from_commands(iter)
  }
}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (index, command) in self.iter().enumerate() {
      if index > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{}", command)?;
    }
    Ok(())
  }
}

impl FromStr for Program {
  type Err = Error;

  fn from_str(source: &str) -> Result<Self, Self::Err> {
    asm::assemble(source)
  }
}
