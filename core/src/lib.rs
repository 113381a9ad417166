pub use chip8::{Chip8, Cycle};
pub use constants::{CLOCK_SPEED, TIMER_HZ};
pub use error::{Error, Result};
pub use instruction::{Flow, Instruction};
pub use opcode::Opcode;

mod chip8;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
pub mod state;
