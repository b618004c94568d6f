mod asm;
pub mod codec;
mod command;
mod config;
mod error;
mod machine;
mod opcode;
mod program;
mod stack;

pub use crate::command::Command;
pub use crate::config::MachineConfig;
pub use crate::error::{Error, Result};
pub use crate::machine::Machine;
pub use crate::opcode::{Opcode, OpcodeDef};
pub use crate::program::{Program, Status, ITEMS_MAX};
pub use crate::stack::{Stack, REG_MAX, SLOT_MAX};

/// Numeric type of the machine values.
pub type Num = f64;

/// Number of inputs and outputs.
pub const CTRL_MAX: usize = 8;
