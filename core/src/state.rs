use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START,
    SPRITE_SHEET, SPRITE_SHEET_ADDR, STACK_SIZE,
};
use crate::error::{Error, Result};

/// The FrameBuffer is indexed as [y][x]
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The Chip-8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) doubles as the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the number of return addresses on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound)
/// - only ever decremented by the timer tick, never by executing instructions
///
/// ## Memory
/// - 16 entry stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sprite sheet
///     - 0x200.. holds the loaded ROM
/// - 32x64 frame buffer plus a flag recording whether it changed since last drawn
///
/// ## Input
/// - the pressed status of keys 0..F, written by whoever drives the machine
/// - while parked on a wait-for-key instruction, the keys that were already down when it began
#[derive(Clone, Debug)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub keys: [bool; KEY_COUNT],
    pub held_on_wait: Option<[bool; KEY_COUNT]>,
    rng: StdRng,
}

impl State {
    /// A fresh state whose random numbers come from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A fresh state whose random numbers are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut state = State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory: [0; MEMORY_SIZE],
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            keys: [false; KEY_COUNT],
            held_on_wait: None,
            rng,
        };
        state.reset();
        state
    }

    /// Restores every machine field to its power-on value.
    /// Key status belongs to the caller and is kept; the random stream carries on where it left off.
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack = [0; STACK_SIZE];

        // 0x000 - 0x050 is reserved for a sprite sheet
        self.memory = [0; MEMORY_SIZE];
        let font = SPRITE_SHEET_ADDR as usize;
        self.memory[font..font + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        self.frame_buffer = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        self.draw_flag = false;
        self.held_on_wait = None;
        debug!("state reset, pc={:#06X}", self.pc);
    }

    /// Copies a ROM into memory starting at 0x200
    ///
    /// # Arguments
    /// * `rom` the raw program bytes
    pub fn load_program(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte program at {:#06X}", rom.len(), start);
        Ok(())
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<u16> {
        let bytes = self.read(self.pc as usize, 2)?;
        Ok(u16::from(bytes[0]) << 8 | u16::from(bytes[1]))
    }

    /// Borrows `len` bytes of memory starting at `addr`
    pub fn read(&self, addr: usize, len: usize) -> Result<&[u8]> {
        let end = Self::checked_end(addr, len)?;
        Ok(&self.memory[addr..end])
    }

    /// Mutably borrows `len` bytes of memory starting at `addr`
    pub fn read_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        let end = Self::checked_end(addr, len)?;
        Ok(&mut self.memory[addr..end])
    }

    fn checked_end(addr: usize, len: usize) -> Result<usize> {
        let end = addr + len;
        if end > MEMORY_SIZE {
            // report the first byte that doesn't exist
            let address = addr.max(MEMORY_SIZE);
            return Err(Error::OutOfBoundsAccess { address });
        }
        Ok(end)
    }

    /// STACK.push(addr)
    pub fn push(&mut self, addr: u16) -> Result<()> {
        let sp = self.sp as usize;
        if sp >= STACK_SIZE {
            return Err(Error::StackOverflow { pc: self.pc });
        }
        self.stack[sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// STACK.pop()
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp as usize])
    }

    /// Replaces the pressed status of every key.
    /// A key let go of during a wait is no longer treated as held from before it.
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        if let Some(held) = &mut self.held_on_wait {
            for (held, &down) in held.iter_mut().zip(keys.iter()) {
                *held &= down;
            }
        }
        self.keys = keys;
    }

    pub fn random_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
