use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("Machine: {0}")]
  Machine(#[from] beatvm_machine::Error),

  #[error("Failed to send the program to the processor")]
  SendFailure,
}
