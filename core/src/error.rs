use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading or running a ROM.
///
/// `ProgramTooLarge` is raised at load time and leaves the session untouched.
/// The rest are raised while executing and end the session; it must be reset before reuse.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("Unknown opcode {opcode:#06X} at pc {pc:#06X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("Stack overflow calling from pc {pc:#06X}")]
    StackOverflow { pc: u16 },

    #[error("Stack underflow returning from pc {pc:#06X}")]
    StackUnderflow { pc: u16 },

    #[error("Memory access out of bounds at address {address:#06X}")]
    OutOfBoundsAccess { address: usize },
}
