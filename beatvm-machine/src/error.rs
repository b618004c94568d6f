use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("Buffer too small: {needed} bytes needed but only {available} available")]
  BufferTooSmall { needed: usize, available: usize },

  #[error("Unknown token '{token}' at line {line}")]
  UnknownToken { token: String, line: usize },

  #[error("Program too long: more than {max} commands")]
  TooManyCommands { max: usize },
}
