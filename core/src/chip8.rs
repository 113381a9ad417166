use std::mem;

use log::{debug, trace, warn};

use crate::constants::KEY_COUNT;
use crate::error::{Error, Result};
use crate::instruction::{Flow, Instruction};
use crate::opcode::Opcode;
use crate::state::{FrameBuffer, State};

/// What happened during a single CPU cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// An instruction ran; `redraw` is set if the frame buffer changed since it was last reported
    Executed { redraw: bool },
    /// The CPU is parked on a wait-for-key instruction and made no progress
    AwaitingKey,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the error that stopped the session, if any
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
///
/// The CPU and the timers are driven separately; whoever owns the `Chip8` decides how
/// many cycles to run per timer tick. Timers are meant to tick at `TIMER_HZ`.
#[derive(Debug)]
pub struct Chip8 {
    state: State,
    fault: Option<Error>,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            fault: None,
        }
    }

    /// A Chip-8 whose random numbers are the same every run
    pub fn with_seed(seed: u64) -> Self {
        Chip8 {
            state: State::with_seed(seed),
            fault: None,
        }
    }

    /// Returns the machine to its power-on state, forgetting the loaded ROM and any fault.
    /// Keys stay as the caller last set them.
    pub fn reset(&mut self) {
        self.state.reset();
        self.fault = None;
    }

    /// Load a rom into memory at 0x200
    ///
    /// # Arguments
    /// * `rom` the raw bytes of a ROM
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.state.load_program(rom)
    }

    /// The pixels of the current frame
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// A read-only view of the machine
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Whether the sound timer is running
    pub fn is_beeping(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.set_key(key, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.set_key(key, false);
    }

    /// Replace the pressed status of every key at once
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.state.set_keys(keys);
    }

    fn set_key(&mut self, key: u8, pressed: bool) {
        let mut keys = self.state.keys;
        match keys.get_mut(key as usize) {
            Some(status) => *status = pressed,
            None => {
                warn!("ignoring key {:#04X}, the keypad only has 0..F", key);
                return;
            }
        }
        self.state.set_keys(keys);
    }

    /// Advances the CPU by a single cycle
    /// - gets, decodes and executes the next opcode
    /// - moves the pc on unless the instruction redirected it or is waiting for a key
    /// - reports and clears the draw flag
    ///
    /// Once a cycle fails the same error is returned until the machine is `reset`.
    pub fn step(&mut self) -> Result<Cycle> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        self.advance_cpu().map_err(|err| {
            warn!("halting: {}", err);
            self.fault = Some(err);
            err
        })
    }

    fn advance_cpu(&mut self) -> Result<Cycle> {
        let pc = self.state.pc;
        let op = self.state.fetch()?;
        let instruction = Instruction::decode(op, pc)?;
        trace!(
            "{} {} pc{:04X} i{:04X} v{:02X?}",
            Opcode::from(op),
            instruction,
            pc,
            self.state.i,
            self.state.v
        );

        let flow = instruction.execute(&mut self.state)?;
        self.state.pc = flow.advance(self.state.pc);

        if flow == Flow::Wait {
            return Ok(Cycle::AwaitingKey);
        }
        let redraw = mem::take(&mut self.state.draw_flag);
        Ok(Cycle::Executed { redraw })
    }

    /// Counts both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }

        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
            if self.state.sound_timer == 0 {
                debug!("sound timer expired");
            }
        }
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_program(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::with_seed(0);
        chip8.load_rom(program).unwrap();
        chip8
    }

    #[test]
    fn test_cycles_cls() {
        let mut chip8 = with_program(&[0x00, 0xE0]);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: true }));
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_redraw_is_reported_once() {
        // LD I, 0x000; DRW V0, V0, 5; LD V1, 0x01
        let mut chip8 = with_program(&[0xA0, 0x00, 0xD0, 0x05, 0x61, 0x01]);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: true }));
        assert!(!chip8.state.draw_flag);
        assert!(chip8.frame_buffer()[0][0]);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
    }

    #[test]
    fn test_set_then_add_immediate() {
        let mut chip8 = with_program(&[0x61, 0xFA, 0x61, 0xF0, 0x71, 0x0F]);
        chip8.step().unwrap();
        assert_eq!(chip8.state.v[0x1], 0xFA);
        assert_eq!(chip8.state.pc, 0x202);
        chip8.step().unwrap();
        assert_eq!(chip8.state.v[0x1], 0xF0);
        chip8.step().unwrap();
        assert_eq!(chip8.state.v[0x1], 0xFF);
        assert_eq!(chip8.state.pc, 0x206);
        assert_eq!(chip8.state.v[0xF], 0x0);
    }

    #[test]
    fn test_nested_calls_return_past_each_call() {
        let mut program = vec![0u8; 0x100];
        // 0x200: CALL 0x210
        program[0x00..0x02].copy_from_slice(&[0x22, 0x10]);
        // 0x202: LD V0, 0xAA
        program[0x02..0x04].copy_from_slice(&[0x60, 0xAA]);
        // 0x210: CALL 0x220; 0x212: RET
        program[0x10..0x14].copy_from_slice(&[0x22, 0x20, 0x00, 0xEE]);
        // 0x220: RET
        program[0x20..0x22].copy_from_slice(&[0x00, 0xEE]);
        let mut chip8 = with_program(&program);

        chip8.step().unwrap();
        assert_eq!((chip8.state.pc, chip8.state.sp), (0x210, 1));
        chip8.step().unwrap();
        assert_eq!((chip8.state.pc, chip8.state.sp), (0x220, 2));
        chip8.step().unwrap();
        assert_eq!((chip8.state.pc, chip8.state.sp), (0x212, 1));
        chip8.step().unwrap();
        assert_eq!((chip8.state.pc, chip8.state.sp), (0x202, 0));
        chip8.step().unwrap();
        assert_eq!(chip8.state.v[0x0], 0xAA);
    }

    #[test]
    fn test_doesnt_cycle_while_waiting_for_key() {
        let mut chip8 = with_program(&[0xF1, 0x0A]);
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.state.pc, 0x200);
    }

    #[test]
    fn test_captures_key_presses() {
        let mut chip8 = with_program(&[0xF1, 0x0A]);
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        chip8.key_press(0xE);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
        assert_eq!(chip8.state.v[0x1], 0xE);
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_key_held_before_wait_doesnt_count() {
        let mut chip8 = with_program(&[0xF1, 0x0A]);
        chip8.key_press(0x5);
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.state.pc, 0x200);

        chip8.key_release(0x5);
        chip8.key_press(0x5);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
        assert_eq!(chip8.state.v[0x1], 0x5);
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_back_to_back_waits_need_two_presses() {
        // LD V1, K; LD V2, K
        let mut chip8 = with_program(&[0xF1, 0x0A, 0xF2, 0x0A]);
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        chip8.key_press(0x8);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
        // still holding 0x8
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        assert_eq!(chip8.state.pc, 0x202);

        chip8.key_release(0x8);
        assert_eq!(chip8.step(), Ok(Cycle::AwaitingKey));
        chip8.key_press(0x4);
        assert_eq!(chip8.step(), Ok(Cycle::Executed { redraw: false }));
        assert_eq!((chip8.state.v[0x1], chip8.state.v[0x2]), (0x8, 0x4));
    }

    #[test]
    fn test_reset_keeps_keys() {
        let mut chip8 = Chip8::with_seed(0);
        chip8.key_press(0xB);
        chip8.reset();
        assert!(chip8.state.keys[0xB]);
    }

    #[test]
    fn test_key_release() {
        let mut chip8 = Chip8::with_seed(0);
        chip8.key_press(0x3);
        assert!(chip8.state.keys[0x3]);
        chip8.key_release(0x3);
        assert!(!chip8.state.keys[0x3]);
        // out of range keys are ignored
        chip8.key_press(0x10);
        assert_eq!(chip8.state.keys, [false; KEY_COUNT]);
    }

    #[test]
    fn test_set_keys() {
        let mut chip8 = Chip8::with_seed(0);
        let mut keys = [false; KEY_COUNT];
        keys[0x9] = true;
        chip8.set_keys(keys);
        assert_eq!(chip8.state.keys, keys);
    }

    #[test]
    fn test_timers_count_down_to_zero() {
        let mut chip8 = Chip8::with_seed(0);
        chip8.state.delay_timer = 60;
        chip8.state.sound_timer = 30;
        assert!(chip8.is_beeping());
        for _ in 0..60 {
            chip8.tick_timers();
        }
        assert_eq!(chip8.state.delay_timer, 0);
        assert_eq!(chip8.state.sound_timer, 0);
        assert!(!chip8.is_beeping());
        chip8.tick_timers();
        assert_eq!(chip8.state.delay_timer, 0);
        assert_eq!(chip8.state.sound_timer, 0);
    }

    #[test]
    fn test_cycles_dont_touch_timers() {
        // LD V0, 0x3C; LD DT, V0; JP 0x204
        let mut chip8 = with_program(&[0x60, 0x3C, 0xF0, 0x15, 0x12, 0x04]);
        for _ in 0..10 {
            chip8.step().unwrap();
        }
        assert_eq!(chip8.state.delay_timer, 0x3C);
    }

    #[test]
    fn test_unknown_opcode_halts_until_reset() {
        let mut chip8 = with_program(&[0x61, 0x01, 0xFF, 0xFF]);
        chip8.step().unwrap();
        let err = Error::UnknownOpcode {
            opcode: 0xFFFF,
            pc: 0x202,
        };
        assert_eq!(chip8.step(), Err(err));
        assert_eq!(chip8.step(), Err(err));

        chip8.reset();
        assert_eq!(chip8.state.pc, 0x200);
        chip8.load_rom(&[0x00, 0xE0]).unwrap();
        assert!(chip8.step().is_ok());
    }

    #[test]
    fn test_running_off_the_end_of_memory() {
        let mut chip8 = Chip8::with_seed(0);
        chip8.state.pc = 0xFFF;
        assert_eq!(
            chip8.step(),
            Err(Error::OutOfBoundsAccess { address: 0x1000 })
        );
    }

    #[test]
    fn test_stack_underflow_is_fatal() {
        let mut chip8 = with_program(&[0x00, 0xEE]);
        assert_eq!(chip8.step(), Err(Error::StackUnderflow { pc: 0x200 }));
    }

    #[test]
    fn test_stack_overflow_is_fatal() {
        // 0x200: CALL 0x200, forever
        let mut chip8 = with_program(&[0x22, 0x00]);
        for depth in 1..=16 {
            chip8.step().unwrap();
            assert_eq!(chip8.state.sp, depth);
        }
        let err = Error::StackOverflow { pc: 0x200 };
        assert_eq!(chip8.step(), Err(err));
        assert_eq!(chip8.state.sp, 16);
        assert_eq!(chip8.step(), Err(err));
    }

    #[test]
    fn test_rejects_oversized_rom() {
        let mut chip8 = Chip8::with_seed(0);
        let rom = vec![0; 4096];
        assert!(matches!(
            chip8.load_rom(&rom),
            Err(Error::ProgramTooLarge { .. })
        ));
    }
}
