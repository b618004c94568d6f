use ringbuf::{Consumer, Producer};

use beatvm_machine::{codec, Program};

use crate::{Error, Notification, Result};

/// Non realtime side of the engine.
pub struct Controller {
  tx: Producer<Program>,
  rx: Consumer<Notification>,
  program: Program,
}

impl Controller {
  pub fn new(tx: Producer<Program>, rx: Consumer<Notification>) -> Self {
    Self {
      tx,
      rx,
      program: Program::new(),
    }
  }

  /// The program most recently sent to the processor.
  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn load_program(&mut self, program: Program) -> Result<()> {
    self.tx.push(program).map_err(|_| {
      log::warn!("Program queue is full, dropping program");
      Error::SendFailure
    })?;
    log::debug!(
      "Loaded program with {} commands ({:?})",
      program.len(),
      program.status()
    );
    self.program = program;
    Ok(())
  }

  pub fn load_bytes(&mut self, data: &[u8]) -> Result<()> {
    self.load_program(codec::decode(data))
  }

  pub fn load_source(&mut self, source: &str) -> Result<()> {
    let program = source.parse::<Program>()?;
    self.load_program(program)
  }

  /// Serialized form of the current program.
  pub fn save(&self) -> Vec<u8> {
    codec::encode(&self.program)
  }

  /// Drain the notifications received from the processor.
  pub fn notifications(&mut self) -> impl Iterator<Item = Notification> + '_ {
    std::iter::from_fn(move || self.rx.pop())
  }
}
