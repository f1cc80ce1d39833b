use rand::RngCore;

use crate::constants::{FONT_START, GLYPH_SIZE};
use crate::error::Result;
use crate::opcode::Opcode;
use crate::peripherals::{KeyState, Speaker};
use crate::state::State;

/// What an operation can reach outside of the machine state for one cycle.
pub struct Bus<'a> {
    /// Keys held when the cycle started.
    pub keys: KeyState,
    pub speaker: &'a mut dyn Speaker,
    pub rng: &'a mut dyn RngCore,
}

/// Every operation mutates `state` in place and is responsible for moving the pc.
pub type Operation = fn(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()>;

/// clear
pub fn clr(_op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.frame_buffer.clear();
    state.advance();
    Ok(())
}

/// PC = STACK.pop()
pub fn rts(_op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.pc = state.stack.pop()?;
    Ok(())
}

/// PC = addr
pub fn jump(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.pc = op.addr();
    Ok(())
}

/// STACK.push(PC + 2); PC = addr
pub fn call(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.stack.push(state.pc.wrapping_add(2))?;
    state.pc = op.addr();
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.skip_if(state.vx(op) == op.kk());
    Ok(())
}

/// if Vx != kk then pc += 2
pub fn skne(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.skip_if(state.vx(op) != op.kk());
    Ok(())
}

/// if Vx == Vy then pc += 2
pub fn skre(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.skip_if(state.vx(op) == state.vy(op));
    Ok(())
}

/// Vx = kk
pub fn load(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] = op.kk();
    state.advance();
    Ok(())
}

/// Vx += kk
/// Wraps on overflow; VF is left alone
pub fn add(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] = state.vx(op).wrapping_add(op.kk());
    state.advance();
    Ok(())
}

/// Vx = Vy
pub fn mv(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] = state.vy(op);
    state.advance();
    Ok(())
}

/// Vx |= Vy
pub fn or(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] |= state.vy(op);
    state.advance();
    Ok(())
}

/// Vx &= Vy
pub fn and(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] &= state.vy(op);
    state.advance();
    Ok(())
}

/// Vx ^= Vy
pub fn xor(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] ^= state.vy(op);
    state.advance();
    Ok(())
}

// The flag-setting ALU ops write the result before VF so that with x = F the flag wins.

/// Vx += Vy; VF = carry
pub fn addr(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let (res, carry) = state.vx(op).overflowing_add(state.vy(op));
    state.v[op.x() as usize] = res;
    state.v[0xF] = u8::from(carry);
    state.advance();
    Ok(())
}

/// Vx -= Vy; VF = !borrow
pub fn sub(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let (vx, vy) = (state.vx(op), state.vy(op));
    state.v[op.x() as usize] = vx.wrapping_sub(vy);
    state.v[0xF] = u8::from(vx >= vy);
    state.advance();
    Ok(())
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let vx = state.vx(op);
    state.v[op.x() as usize] = vx >> 1;
    state.v[0xF] = vx & 0x1;
    state.advance();
    Ok(())
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let (vx, vy) = (state.vx(op), state.vy(op));
    state.v[op.x() as usize] = vy.wrapping_sub(vx);
    state.v[0xF] = u8::from(vy >= vx);
    state.advance();
    Ok(())
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let vx = state.vx(op);
    state.v[op.x() as usize] = vx << 1;
    state.v[0xF] = vx >> 7;
    state.advance();
    Ok(())
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.skip_if(state.vx(op) != state.vy(op));
    Ok(())
}

/// I = addr
pub fn loadi(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.i = op.addr();
    state.advance();
    Ok(())
}

/// PC = V0 + addr
pub fn jumpi(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.pc = op.addr() + u16::from(state.v[0x0]);
    Ok(())
}

/// Vx = rand_byte & kk
pub fn rand(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()> {
    let rand_byte = bus.rng.next_u32() as u8;
    state.v[op.x() as usize] = rand_byte & op.kk();
    state.advance();
    Ok(())
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite in memory I..I+n onto the FrameBuffer at x, y with wrapping.
/// Sets VF if any pixels were erased
pub fn draw(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let rows = op.n() as usize;
    let mut sprite = [0u8; 0xF];
    sprite[..rows].copy_from_slice(state.bytes(state.i, rows)?);

    let (x, y) = (state.vx(op), state.vy(op));
    let collided = state.frame_buffer.draw_sprite(&sprite[..rows], x, y);
    state.v[0xF] = u8::from(collided);
    state.advance();
    Ok(())
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()> {
    state.skip_if(bus.keys.is_pressed(state.vx(op)));
    Ok(())
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()> {
    state.skip_if(!bus.keys.is_pressed(state.vx(op)));
    Ok(())
}

/// Vx = DT
pub fn moved(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.v[op.x() as usize] = state.timers.delay;
    state.advance();
    Ok(())
}

/// await keypress for Vx
/// The pc stays put until a key is down, so this runs again every cycle until then.
pub fn keyd(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()> {
    if let Some(key) = bus.keys.first_pressed() {
        state.v[op.x() as usize] = key;
        state.advance();
    }
    Ok(())
}

/// DT = Vx
pub fn loads(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.timers.delay = state.vx(op);
    state.advance();
    Ok(())
}

/// ST = Vx
/// Starts the tone when set above zero, stops it when a playing tone is set to zero
pub fn ld(op: Opcode, state: &mut State, bus: &mut Bus) -> Result<()> {
    let was_playing = state.timers.sound > 0;
    state.timers.sound = state.vx(op);
    if state.timers.sound > 0 {
        bus.speaker.start_sound();
    } else if was_playing {
        bus.speaker.stop_sound();
    }
    state.advance();
    Ok(())
}

/// I += Vx
pub fn addi(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.i = state.i.wrapping_add(u16::from(state.vx(op)));
    state.advance();
    Ok(())
}

/// I = Vx * 5
/// Points I at the font glyph for the low nibble of Vx
pub fn ldspr(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    state.i = FONT_START + u16::from(state.vx(op) & 0xF) * GLYPH_SIZE;
    state.advance();
    Ok(())
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let vx = state.vx(op);
    let digits = [vx / 100, vx / 10 % 10, vx % 10];
    state.bytes_mut(state.i, 3)?.copy_from_slice(&digits);
    state.advance();
    Ok(())
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let count = op.x() as usize + 1;
    let registers = state.v;
    state
        .bytes_mut(state.i, count)?
        .copy_from_slice(&registers[..count]);
    state.advance();
    Ok(())
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(op: Opcode, state: &mut State, _bus: &mut Bus) -> Result<()> {
    let count = op.x() as usize + 1;
    let mut registers = state.v;
    registers[..count].copy_from_slice(state.bytes(state.i, count)?);
    state.v = registers;
    state.advance();
    Ok(())
}
