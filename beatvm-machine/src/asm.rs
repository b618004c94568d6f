use crate::program::ITEMS_MAX;
use crate::{Command, Error, Opcode, Program, Result};

fn parse_token(token: &str) -> Option<Command> {
  match token {
    "true" => Some(Command::Bool(true)),
    "false" => Some(Command::Bool(false)),
    _ => token
      .parse::<i32>()
      .map(Command::Int)
      .or_else(|_| token.parse::<f32>().map(Command::Float))
      .ok()
      .or_else(|| Opcode::from_mnemonic(token).map(Command::Opcode)),
  }
}

/// Assemble a program from its textual form.
///
/// ```text
/// # frequency of an LFO synced to the beat
/// time:beat 2 * pi * sin
/// ```
pub(crate) fn assemble(source: &str) -> Result<Program> {
  let mut commands = Vec::with_capacity(ITEMS_MAX);

  for (index, line) in source.lines().enumerate() {
    let code = line.split('#').next().unwrap_or_default();
    for token in code.split_whitespace() {
      let command = parse_token(token).ok_or_else(|| Error::UnknownToken {
        token: token.to_string(),
        line: index + 1,
      })?;

      if commands.len() == ITEMS_MAX {
        return Err(Error::TooManyCommands { max: ITEMS_MAX });
      }
      commands.push(command);
    }
  }

  Ok(Program::from_commands(commands))
}
