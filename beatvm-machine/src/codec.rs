//! Binary form of a program: a sequence of items made of a tag byte and a little-endian payload.

use crate::program::ITEMS_MAX;
use crate::{Command, Error, Opcode, Program, Result};

const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_LONG: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_DOUBLE: u8 = 0x05;
const TAG_OPCODE: u8 = 0x06;

const MAX_ITEM_LEN: usize = 5;

/// Upper bound of the encoded size of any program.
pub const MAX_ENCODED_LEN: usize = ITEMS_MAX * MAX_ITEM_LEN;

/// Decodes commands until the data ends or an item can not be decoded.
pub struct Decoder<'a> {
  data: &'a [u8],
  index: usize,
}

impl<'a> Decoder<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self { data, index: 0 }
  }

  /// Number of bytes consumed so far.
  pub fn position(&self) -> usize {
    self.index
  }

  fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
    let bytes = self.data.get(self.index..self.index + N)?;
    self.index += N;
    bytes.try_into().ok()
  }

  fn decode(&mut self, tag: u8) -> Option<Command> {
    match tag {
      TAG_BOOL => self
        .take::<4>()
        .map(|bytes| Command::Bool(i32::from_le_bytes(bytes) != 0)),
      TAG_INT => self
        .take::<4>()
        .map(|bytes| Command::Int(i32::from_le_bytes(bytes))),
      // narrowed to the int literal
      TAG_LONG => self
        .take::<8>()
        .map(|bytes| Command::Int(i64::from_le_bytes(bytes) as i32)),
      TAG_FLOAT => self
        .take::<4>()
        .map(|bytes| Command::Float(f32::from_le_bytes(bytes))),
      // narrowed to the float literal
      TAG_DOUBLE => self
        .take::<8>()
        .map(|bytes| Command::Float(f64::from_le_bytes(bytes) as f32)),
      TAG_OPCODE => self
        .take::<1>()
        .map(|[code]| Command::Opcode(Opcode::from_code(code).unwrap_or(Opcode::Nop))),
      _ => None,
    }
  }
}

impl<'a> Iterator for Decoder<'a> {
  type Item = Command;

  fn next(&mut self) -> Option<Self::Item> {
    let tag = *self.data.get(self.index)?;
    self.index += 1;
    let command = self.decode(tag);
    if command.is_none() {
      self.index = self.data.len();
    }
    command
  }
}

/// Decode a program, silently truncating it at the first item that can not be decoded.
pub fn decode(data: &[u8]) -> Program {
  let mut decoder = Decoder::new(data);
  let program = Program::from_commands(decoder.by_ref());
  if program.len() < ITEMS_MAX && decoder.position() < data.len() {
    log::debug!(
      "Program truncated after {} commands at byte {} of {}",
      program.len(),
      decoder.position(),
      data.len()
    );
  }
  program
}

fn encode_command(command: &Command) -> ([u8; MAX_ITEM_LEN], usize) {
  let mut item = [0u8; MAX_ITEM_LEN];
  let len = match command {
    Command::Nop => 0,
    Command::Bool(value) => {
      item[0] = TAG_BOOL;
      item[1..5].copy_from_slice(&(*value as i32).to_le_bytes());
      5
    }
    Command::Int(value) => {
      item[0] = TAG_INT;
      item[1..5].copy_from_slice(&value.to_le_bytes());
      5
    }
    Command::Float(value) => {
      item[0] = TAG_FLOAT;
      item[1..5].copy_from_slice(&value.to_le_bytes());
      5
    }
    Command::Opcode(opcode) => {
      item[0] = TAG_OPCODE;
      item[1] = opcode.code();
      2
    }
  };
  (item, len)
}

pub fn encoded_len(program: &Program) -> usize {
  program
    .iter()
    .map(|command| encode_command(command).1)
    .sum()
}

/// Encode the program into `buffer`, returning the number of bytes written.
///
/// Nothing is written if the buffer is too small.
pub fn encode_into(program: &Program, buffer: &mut [u8]) -> Result<usize> {
  let needed = encoded_len(program);
  if needed > buffer.len() {
    return Err(Error::BufferTooSmall {
      needed,
      available: buffer.len(),
    });
  }

  let mut index = 0;
  for command in program.iter() {
    let (item, len) = encode_command(command);
    buffer[index..index + len].copy_from_slice(&item[..len]);
    index += len;
  }
  Ok(index)
}

pub fn encode(program: &Program) -> Vec<u8> {
  let mut buffer = vec![0u8; encoded_len(program)];
  let len = encode_into(program, &mut buffer).unwrap_or(0);
  buffer.truncate(len);
  buffer
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Status;

  fn item(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut item = vec![tag];
    item.extend_from_slice(payload);
    item
  }

  #[test]
  fn decode_literals() {
    let test_cases = vec![
      (item(0x01, &1i32.to_le_bytes()), Command::Bool(true)),
      (item(0x01, &0i32.to_le_bytes()), Command::Bool(false)),
      (item(0x02, &(-7i32).to_le_bytes()), Command::Int(-7)),
      (item(0x03, &42i64.to_le_bytes()), Command::Int(42)),
      (item(0x04, &0.25f32.to_le_bytes()), Command::Float(0.25)),
      (item(0x05, &1.5f64.to_le_bytes()), Command::Float(1.5)),
      (item(0x06, &[10]), Command::Opcode(Opcode::Add)),
    ];

    for (data, expected) in test_cases {
      let program = decode(&data);
      assert_eq!(program.len(), 1);
      assert_eq!(program[0], expected);
    }
  }

  #[test]
  fn unknown_opcode_decodes_to_nop() {
    let program = decode(&[0x06, 0xff]);
    assert_eq!(program[0], Command::Opcode(Opcode::Nop));
  }

  #[test]
  fn decoding_stops_at_unknown_tag() {
    let mut data = item(0x02, &3i32.to_le_bytes());
    data.extend(item(0x7f, &[0, 0, 0, 0]));
    data.extend(item(0x02, &4i32.to_le_bytes()));

    let program = decode(&data);
    assert_eq!(program.len(), 1);
    assert_eq!(program[1], Command::Nop);
  }

  #[test]
  fn decoding_stops_at_truncated_item() {
    let mut data = item(0x04, &2.0f32.to_le_bytes());
    data.extend(&[0x02, 0x01, 0x00]);

    let program = decode(&data);
    assert_eq!(program.len(), 1);
    assert_eq!(program[0], Command::Float(2.0));
  }

  #[test]
  fn decoder_is_fused() {
    let data = [0x7f, 0x06, 0x0a];
    let mut decoder = Decoder::new(&data);
    assert_eq!(decoder.next(), None);
    assert_eq!(decoder.next(), None);
  }

  #[test]
  fn decoding_stops_at_capacity() {
    let data: Vec<u8> = (0..ITEMS_MAX + 3).flat_map(|_| item(0x06, &[10])).collect();
    let program = decode(&data);
    assert_eq!(program.len(), ITEMS_MAX);
  }

  #[test]
  fn decode_status() {
    let test_cases = vec![
      (vec![0x06, Opcode::Speed.code()], Status::HAS_TIME),
      (vec![0x06, Opcode::Rand.code()], Status::HAS_RAND),
      (vec![0x06, Opcode::FramesPerSecond.code()], Status::STATIC),
      (vec![0x06, Opcode::Add.code()], Status::STATIC),
    ];
    for (data, expected) in test_cases {
      assert_eq!(decode(&data).status(), expected);
    }
  }

  #[test]
  fn decode_empty() {
    assert!(decode(&[]).is_empty());
  }

  #[test]
  fn encode_then_decode() {
    let program = Program::from_commands(vec![
      Command::Bool(true),
      Command::Int(-12),
      Command::Float(0.5),
      Opcode::Nop.into(),
      Opcode::Speed.into(),
      Opcode::Goto.into(),
    ]);

    let data = encode(&program);
    assert_eq!(data.len(), 5 + 5 + 5 + 2 + 2 + 2);
    assert_eq!(decode(&data), program);
  }

  #[test]
  fn encoding_stops_at_terminator() {
    let program = Program::from_commands(vec![Command::Int(1), Command::Nop, Command::Int(2)]);
    assert_eq!(encode(&program), item(0x02, &1i32.to_le_bytes()));
  }

  #[test]
  fn encode_into_small_buffer() {
    let program = Program::from_commands(vec![Command::Int(1), Opcode::Neg.into()]);
    let mut buffer = [0u8; 4];
    assert_eq!(
      encode_into(&program, &mut buffer),
      Err(Error::BufferTooSmall {
        needed: 7,
        available: 4
      })
    );
    assert_eq!(buffer, [0u8; 4]);

    let mut buffer = [0u8; MAX_ENCODED_LEN];
    assert_eq!(encode_into(&program, &mut buffer), Ok(7));
  }
}
