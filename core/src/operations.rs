use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, SPRITE_HEIGHT, SPRITE_SHEET_ADDR};
use crate::error::Result;
use crate::instruction::Flow;
use crate::state::State;

/// clear
pub fn clr(state: &mut State) -> Flow {
    state.frame_buffer = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    state.draw_flag = true;
    Flow::Next
}

/// PC = STACK.pop()
/// The popped address is the call itself; the cycle then steps past it
pub fn rts(state: &mut State) -> Result<Flow> {
    state.pc = state.pop()?;
    Ok(Flow::Next)
}

/// PC = addr
pub fn jump(state: &mut State, addr: u16) -> Flow {
    state.pc = addr;
    Flow::Jump
}

/// STACK.push(PC); PC = addr
pub fn call(state: &mut State, addr: u16) -> Result<Flow> {
    state.push(state.pc)?;
    state.pc = addr;
    Ok(Flow::Jump)
}

/// if Vx == nn then pc += 2
pub fn ske(state: &mut State, x: u8, byte: u8) -> Flow {
    Flow::skip_if(state.v[x as usize] == byte)
}

/// if Vx != nn then pc += 2
pub fn skne(state: &mut State, x: u8, byte: u8) -> Flow {
    Flow::skip_if(state.v[x as usize] != byte)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &mut State, x: u8, y: u8) -> Flow {
    Flow::skip_if(state.v[x as usize] == state.v[y as usize])
}

/// Vx = nn
pub fn load(state: &mut State, x: u8, byte: u8) -> Flow {
    state.v[x as usize] = byte;
    Flow::Next
}

/// Vx += nn
/// Overflow wraps and VF is left alone
pub fn add(state: &mut State, x: u8, byte: u8) -> Flow {
    state.v[x as usize] = state.v[x as usize].wrapping_add(byte);
    Flow::Next
}

/// Vx = Vy
pub fn mv(state: &mut State, x: u8, y: u8) -> Flow {
    state.v[x as usize] = state.v[y as usize];
    Flow::Next
}

/// Vx |= Vy
pub fn or(state: &mut State, x: u8, y: u8) -> Flow {
    state.v[x as usize] |= state.v[y as usize];
    Flow::Next
}

/// Vx &= Vy
pub fn and(state: &mut State, x: u8, y: u8) -> Flow {
    state.v[x as usize] &= state.v[y as usize];
    Flow::Next
}

/// Vx ^= Vy
pub fn xor(state: &mut State, x: u8, y: u8) -> Flow {
    state.v[x as usize] ^= state.v[y as usize];
    Flow::Next
}

/// Vx += Vy; VF = overflow
pub fn addr(state: &mut State, x: u8, y: u8) -> Flow {
    let (res, over) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    state.v[0xF] = u8::from(over);
    state.v[x as usize] = res;
    Flow::Next
}

/// Vx -= Vy; VF = !underflow
pub fn sub(state: &mut State, x: u8, y: u8) -> Flow {
    let (res, under) = state.v[x as usize].overflowing_sub(state.v[y as usize]);
    state.v[0xF] = u8::from(!under);
    state.v[x as usize] = res;
    Flow::Next
}

/// Vx >>= 1; VF = shifted out bit
pub fn shr(state: &mut State, x: u8) -> Flow {
    let vx = state.v[x as usize];
    state.v[0xF] = vx & 0x1;
    state.v[x as usize] = vx >> 1;
    Flow::Next
}

/// Vx = Vy - Vx; VF = !underflow
pub fn subn(state: &mut State, x: u8, y: u8) -> Flow {
    let (res, under) = state.v[y as usize].overflowing_sub(state.v[x as usize]);
    state.v[0xF] = u8::from(!under);
    state.v[x as usize] = res;
    Flow::Next
}

/// Vx <<= 1; VF = shifted out bit
pub fn shl(state: &mut State, x: u8) -> Flow {
    let vx = state.v[x as usize];
    state.v[0xF] = (vx >> 7) & 0x1;
    state.v[x as usize] = vx << 1;
    Flow::Next
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &mut State, x: u8, y: u8) -> Flow {
    Flow::skip_if(state.v[x as usize] != state.v[y as usize])
}

/// I = addr
pub fn loadi(state: &mut State, addr: u16) -> Flow {
    state.i = addr;
    Flow::Next
}

/// PC = V0 + addr
pub fn jumpi(state: &mut State, addr: u16) -> Flow {
    state.pc = u16::from(state.v[0x0]) + addr;
    Flow::Jump
}

/// Vx = rand_byte & nn
pub fn rand(state: &mut State, x: u8, byte: u8) -> Flow {
    let random = state.random_byte();
    state.v[x as usize] = random & byte;
    Flow::Next
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer with wrapping.
/// Sets VF if any pixels were erased
pub fn draw(state: &mut State, x: u8, y: u8, height: u8) -> Result<Flow> {
    let height = height as usize;
    let mut sprite = [0u8; 0xF];
    sprite[..height].copy_from_slice(state.read(state.i as usize, height)?);

    let left = state.v[x as usize] as usize;
    let top = state.v[y as usize] as usize;
    let mut collision = false;
    let mut changed = false;

    for (row, &byte) in sprite[..height].iter().enumerate() {
        let py = (top + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if (byte >> (7 - bit)) & 0x1 == 0 {
                continue;
            }
            let px = (left + bit) % DISPLAY_WIDTH;
            let pixel = &mut state.frame_buffer[py][px];
            collision |= *pixel;
            *pixel = !*pixel;
            changed = true;
        }
    }

    state.v[0xF] = u8::from(collision);
    state.draw_flag |= changed;
    Ok(Flow::Next)
}

/// Keys past F can't be pressed
fn is_pressed(state: &State, x: u8) -> bool {
    state
        .keys
        .get(state.v[x as usize] as usize)
        .copied()
        .unwrap_or(false)
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &mut State, x: u8) -> Flow {
    Flow::skip_if(is_pressed(state, x))
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &mut State, x: u8) -> Flow {
    Flow::skip_if(!is_pressed(state, x))
}

/// Vx = DT
pub fn moved(state: &mut State, x: u8) -> Flow {
    state.v[x as usize] = state.delay_timer;
    Flow::Next
}

/// await keypress for Vx
/// Holds the pc in place until a key goes down that wasn't already down when the wait began,
/// taking the lowest if several do
pub fn keyd(state: &mut State, x: u8) -> Flow {
    let keys = state.keys;
    let held = state.held_on_wait.get_or_insert(keys);
    for (held, &down) in held.iter_mut().zip(keys.iter()) {
        *held &= down;
    }
    let pressed = keys
        .iter()
        .zip(held.iter())
        .position(|(&down, &held)| down && !held);

    match pressed {
        Some(key) => {
            state.v[x as usize] = key as u8;
            state.held_on_wait = None;
            Flow::Next
        }
        None => Flow::Wait,
    }
}

/// DT = Vx
pub fn loads(state: &mut State, x: u8) -> Flow {
    state.delay_timer = state.v[x as usize];
    Flow::Next
}

/// ST = Vx
pub fn ld(state: &mut State, x: u8) -> Flow {
    state.sound_timer = state.v[x as usize];
    Flow::Next
}

/// I += Vx
pub fn addi(state: &mut State, x: u8) -> Flow {
    state.i = state.i.wrapping_add(u16::from(state.v[x as usize]));
    Flow::Next
}

/// I = sprite_sheet + (Vx & 0xF) * 5
/// Set I to the memory address of the sprite for the low digit of Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &mut State, x: u8) -> Flow {
    let digit = u16::from(state.v[x as usize] & 0xF);
    state.i = SPRITE_SHEET_ADDR + digit * SPRITE_HEIGHT;
    Flow::Next
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &mut State, x: u8) -> Result<Flow> {
    let vx = state.v[x as usize];
    let digits = [vx / 100 % 10, vx / 10 % 10, vx % 10];
    state.read_mut(state.i as usize, 3)?.copy_from_slice(&digits);
    Ok(Flow::Next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(state: &mut State, x: u8) -> Result<Flow> {
    let count = x as usize + 1;
    let registers = state.v;
    state
        .read_mut(state.i as usize, count)?
        .copy_from_slice(&registers[..count]);
    Ok(Flow::Next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(state: &mut State, x: u8) -> Result<Flow> {
    let count = x as usize + 1;
    let mut registers = state.v;
    registers[..count].copy_from_slice(state.read(state.i as usize, count)?);
    state.v = registers;
    Ok(Flow::Next)
}
