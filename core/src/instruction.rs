use std::fmt;

use crate::error::{Error, Result};
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// What the execution cycle should do with the pc once an instruction has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Move on to the next instruction
    Next,
    /// Skip over the next instruction
    Skip,
    /// The instruction already pointed the pc somewhere else
    Jump,
    /// Stay on this instruction until a key is pressed
    Wait,
}

impl Flow {
    pub(crate) fn skip_if(condition: bool) -> Self {
        if condition {
            Flow::Skip
        } else {
            Flow::Next
        }
    }

    /// The pc to continue from after an instruction at `pc`
    pub fn advance(self, pc: u16) -> u16 {
        match self {
            Flow::Next => pc.wrapping_add(0x2),
            Flow::Skip => pc.wrapping_add(0x4),
            Flow::Jump | Flow::Wait => pc,
        }
    }
}

/// # Instructions
/// A decoded opcode along with its operands.
///
/// Register operands (`x`, `y`) are always 0..=F since they come from a single nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn; machine code routine, ignored
    Sys { addr: u16 },
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xnn
    SkipEqImm { x: u8, byte: u8 },
    /// 4xnn
    SkipNeqImm { x: u8, byte: u8 },
    /// 5xy0
    SkipEqReg { x: u8, y: u8 },
    /// 6xnn
    SetImm { x: u8, byte: u8 },
    /// 7xnn
    AddImm { x: u8, byte: u8 },
    /// 8xy0
    SetReg { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4
    AddReg { x: u8, y: u8 },
    /// 8xy5
    SubReg { x: u8, y: u8 },
    /// 8xy6
    ShiftRight { x: u8, y: u8 },
    /// 8xy7
    SubReverse { x: u8, y: u8 },
    /// 8xyE
    ShiftLeft { x: u8, y: u8 },
    /// 9xy0
    SkipNeqReg { x: u8, y: u8 },
    /// Annn
    SetIndex { addr: u16 },
    /// Bnnn
    JumpOffset { addr: u16 },
    /// Cxnn
    Random { x: u8, byte: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, height: u8 },
    /// Ex9E
    SkipKeyPressed { x: u8 },
    /// ExA1
    SkipKeyNotPressed { x: u8 },
    /// Fx07
    GetDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddIndex { x: u8 },
    /// Fx29
    FontChar { x: u8 },
    /// Fx33
    Bcd { x: u8 },
    /// Fx55
    StoreRegisters { x: u8 },
    /// Fx65
    LoadRegisters { x: u8 },
}

impl Instruction {
    /// Selects the correct Instruction for a given opcode
    ///
    /// # Arguments
    /// * `word` the raw 16-bit opcode
    /// * `pc` where the opcode was fetched from; only used to report unknown opcodes
    pub fn decode(word: u16, pc: u16) -> Result<Self> {
        let op = Opcode::from(word);
        let Opcode { family, x, y, n } = op;
        let instruction = match (family, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Instruction::Clear,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Return,
            (0x0, ..) => Instruction::Sys { addr: op.nnn() },
            (0x1, ..) => Instruction::Jump { addr: op.nnn() },
            (0x2, ..) => Instruction::Call { addr: op.nnn() },
            (0x3, ..) => Instruction::SkipEqImm { x, byte: op.nn() },
            (0x4, ..) => Instruction::SkipNeqImm { x, byte: op.nn() },
            (0x5, .., 0x0) => Instruction::SkipEqReg { x, y },
            (0x6, ..) => Instruction::SetImm { x, byte: op.nn() },
            (0x7, ..) => Instruction::AddImm { x, byte: op.nn() },
            (0x8, .., 0x0) => Instruction::SetReg { x, y },
            (0x8, .., 0x1) => Instruction::Or { x, y },
            (0x8, .., 0x2) => Instruction::And { x, y },
            (0x8, .., 0x3) => Instruction::Xor { x, y },
            (0x8, .., 0x4) => Instruction::AddReg { x, y },
            (0x8, .., 0x5) => Instruction::SubReg { x, y },
            (0x8, .., 0x6) => Instruction::ShiftRight { x, y },
            (0x8, .., 0x7) => Instruction::SubReverse { x, y },
            (0x8, .., 0xE) => Instruction::ShiftLeft { x, y },
            (0x9, .., 0x0) => Instruction::SkipNeqReg { x, y },
            (0xA, ..) => Instruction::SetIndex { addr: op.nnn() },
            (0xB, ..) => Instruction::JumpOffset { addr: op.nnn() },
            (0xC, ..) => Instruction::Random { x, byte: op.nn() },
            (0xD, ..) => Instruction::Draw { x, y, height: n },
            (0xE, .., 0x9, 0xE) => Instruction::SkipKeyPressed { x },
            (0xE, .., 0xA, 0x1) => Instruction::SkipKeyNotPressed { x },
            (0xF, .., 0x0, 0x7) => Instruction::GetDelay { x },
            (0xF, .., 0x0, 0xA) => Instruction::WaitKey { x },
            (0xF, .., 0x1, 0x5) => Instruction::SetDelay { x },
            (0xF, .., 0x1, 0x8) => Instruction::SetSound { x },
            (0xF, .., 0x1, 0xE) => Instruction::AddIndex { x },
            (0xF, .., 0x2, 0x9) => Instruction::FontChar { x },
            (0xF, .., 0x3, 0x3) => Instruction::Bcd { x },
            (0xF, .., 0x5, 0x5) => Instruction::StoreRegisters { x },
            (0xF, .., 0x6, 0x5) => Instruction::LoadRegisters { x },
            _ => return Err(Error::UnknownOpcode { opcode: word, pc }),
        };
        Ok(instruction)
    }

    /// Runs the instruction against `state`, leaving the pc for the caller to advance
    pub fn execute(&self, state: &mut State) -> Result<Flow> {
        match *self {
            Instruction::Sys { .. } => Ok(Flow::Next),
            Instruction::Clear => Ok(clr(state)),
            Instruction::Return => rts(state),
            Instruction::Jump { addr } => Ok(jump(state, addr)),
            Instruction::Call { addr } => call(state, addr),
            Instruction::SkipEqImm { x, byte } => Ok(ske(state, x, byte)),
            Instruction::SkipNeqImm { x, byte } => Ok(skne(state, x, byte)),
            Instruction::SkipEqReg { x, y } => Ok(skre(state, x, y)),
            Instruction::SetImm { x, byte } => Ok(load(state, x, byte)),
            Instruction::AddImm { x, byte } => Ok(add(state, x, byte)),
            Instruction::SetReg { x, y } => Ok(mv(state, x, y)),
            Instruction::Or { x, y } => Ok(or(state, x, y)),
            Instruction::And { x, y } => Ok(and(state, x, y)),
            Instruction::Xor { x, y } => Ok(xor(state, x, y)),
            Instruction::AddReg { x, y } => Ok(addr(state, x, y)),
            Instruction::SubReg { x, y } => Ok(sub(state, x, y)),
            Instruction::ShiftRight { x, .. } => Ok(shr(state, x)),
            Instruction::SubReverse { x, y } => Ok(subn(state, x, y)),
            Instruction::ShiftLeft { x, .. } => Ok(shl(state, x)),
            Instruction::SkipNeqReg { x, y } => Ok(skrne(state, x, y)),
            Instruction::SetIndex { addr } => Ok(loadi(state, addr)),
            Instruction::JumpOffset { addr } => Ok(jumpi(state, addr)),
            Instruction::Random { x, byte } => Ok(rand(state, x, byte)),
            Instruction::Draw { x, y, height } => draw(state, x, y, height),
            Instruction::SkipKeyPressed { x } => Ok(skpr(state, x)),
            Instruction::SkipKeyNotPressed { x } => Ok(skup(state, x)),
            Instruction::GetDelay { x } => Ok(moved(state, x)),
            Instruction::WaitKey { x } => Ok(keyd(state, x)),
            Instruction::SetDelay { x } => Ok(loads(state, x)),
            Instruction::SetSound { x } => Ok(ld(state, x)),
            Instruction::AddIndex { x } => Ok(addi(state, x)),
            Instruction::FontChar { x } => Ok(ldspr(state, x)),
            Instruction::Bcd { x } => bcd(state, x),
            Instruction::StoreRegisters { x } => stor(state, x),
            Instruction::LoadRegisters { x } => read(state, x),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::Sys { addr } => write!(f, "SYS {:#05X}", addr),
            Instruction::Clear => write!(f, "CLS"),
            Instruction::Return => write!(f, "RET"),
            Instruction::Jump { addr } => write!(f, "JP {:#05X}", addr),
            Instruction::Call { addr } => write!(f, "CALL {:#05X}", addr),
            Instruction::SkipEqImm { x, byte } => write!(f, "SE V{:X}, {:#04X}", x, byte),
            Instruction::SkipNeqImm { x, byte } => write!(f, "SNE V{:X}, {:#04X}", x, byte),
            Instruction::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::SetImm { x, byte } => write!(f, "LD V{:X}, {:#04X}", x, byte),
            Instruction::AddImm { x, byte } => write!(f, "ADD V{:X}, {:#04X}", x, byte),
            Instruction::SetReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Instruction::Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            Instruction::And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Instruction::Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Instruction::AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Instruction::SubReg { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Instruction::ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            Instruction::SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Instruction::ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            Instruction::SkipNeqReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::SetIndex { addr } => write!(f, "LD I, {:#05X}", addr),
            Instruction::JumpOffset { addr } => write!(f, "JP V0, {:#05X}", addr),
            Instruction::Random { x, byte } => write!(f, "RND V{:X}, {:#04X}", x, byte),
            Instruction::Draw { x, y, height } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, height),
            Instruction::SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            Instruction::SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            Instruction::GetDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::WaitKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::SetSound { x } => write!(f, "LD ST, V{:X}", x),
            Instruction::AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::FontChar { x } => write!(f, "LD F, V{:X}", x),
            Instruction::Bcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
