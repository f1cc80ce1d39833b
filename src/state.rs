use crate::constants::{
    FONT_START, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET,
};
use crate::error::{Fault, Result};
use crate::frame_buffer::FrameBuffer;
use crate::opcode::Opcode;
use crate::stack::Stack;
use crate::timers::Timers;

/// The Chip-8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter pointing at the next instruction
///
/// Timers
/// - 2 8-bit timers (delay & sound), counting down at 60Hz
///
/// ## Memory
/// - a bounded call stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sprites
///     - programs are loaded at 0x200
/// - a 64x32 frame buffer
#[derive(Debug, Clone)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub timers: Timers,
    pub stack: Stack,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
}

impl State {
    pub fn new(stack_depth: usize, timer_hz: u32) -> Self {
        let mut state = State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            timers: Timers::new(timer_hz),
            stack: Stack::new(stack_depth),
            memory: [0; MEMORY_SIZE],
            frame_buffer: FrameBuffer::new(),
        };
        state.install_font();
        state
    }

    /// Puts the machine back to power-on: everything zeroed, the font in place and the
    /// PC at the start of program memory.
    pub fn reset(&mut self) {
        self.v = [0; REGISTER_COUNT];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.timers.reset();
        self.stack.clear();
        self.memory = [0; MEMORY_SIZE];
        self.frame_buffer = FrameBuffer::new();
        self.install_font();
    }

    fn install_font(&mut self) {
        let start = FONT_START as usize;
        self.memory[start..start + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);
    }

    /// Copies a program into memory at 0x200. Nothing else is touched.
    ///
    /// A program that doesn't fit is rejected outright; memory is left as it was.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Fault::ProgramTooLarge {
                len: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Gets the opcode at `pc`.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn read_opcode(&self, pc: u16) -> Result<Opcode> {
        let bytes = self.bytes(pc, 2)?;
        Ok(Opcode::from_bytes(bytes[0], bytes[1]))
    }

    /// `len` bytes starting at `addr`, or a fault if that runs past the end of memory.
    pub fn bytes(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let range = Self::range(addr, len)?;
        Ok(&self.memory[range])
    }

    pub fn bytes_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let range = Self::range(addr, len)?;
        Ok(&mut self.memory[range])
    }

    fn range(addr: u16, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Fault::AddressOutOfBounds { addr: end - 1 });
        }
        Ok(start..end)
    }

    /// Reads Vx.
    pub fn vx(&self, op: Opcode) -> u8 {
        self.v[op.x() as usize]
    }

    /// Reads Vy.
    pub fn vy(&self, op: Opcode) -> u8 {
        self.v[op.y() as usize]
    }

    /// Moves past the current instruction.
    pub fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Moves past the current instruction, and past the next one too if `condition` holds.
    pub fn skip_if(&mut self, condition: bool) {
        self.advance();
        if condition {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GLYPH_SIZE, STACK_DEPTH, TIMER_HZ};

    fn state() -> State {
        State::new(STACK_DEPTH, TIMER_HZ)
    }

    #[test]
    fn test_reset_then_empty_load() {
        let mut state = state();
        state.v[3] = 9;
        state.i = 0x300;
        state.pc = 0x400;
        state.timers.delay = 5;
        state.timers.sound = 6;
        state.stack.push(0x202).unwrap();
        state.memory[0x250] = 0xAA;
        state.frame_buffer.draw_sprite(&[0xFF], 0, 0);

        state.reset();
        state.load(&[]).unwrap();

        assert_eq!(state.pc, 0x200);
        assert_eq!(state.v, [0; 16]);
        assert_eq!(state.i, 0);
        assert_eq!(state.timers.delay, 0);
        assert_eq!(state.timers.sound, 0);
        assert!(state.stack.is_empty());
        assert_eq!(state.frame_buffer.lit_pixels(), 0);
        assert_eq!(state.memory[0x250], 0);
        for k in 0..16 {
            let start = (k * GLYPH_SIZE) as usize;
            assert_eq!(
                state.memory[start..start + 5],
                SPRITE_SHEET[start..start + 5]
            );
        }
    }

    #[test]
    fn test_load_writes_at_0x200() {
        let mut state = state();
        state.v[1] = 7;
        state.load(&[0x00, 0xE0, 0x12, 0x00]).unwrap();
        assert_eq!(state.memory[0x200..0x204], [0x00, 0xE0, 0x12, 0x00]);
        // loading doesn't reset anything else
        assert_eq!(state.v[1], 7);
    }

    #[test]
    fn test_load_largest_program() {
        let mut state = state();
        let program = vec![0xAB; MAX_PROGRAM_SIZE];
        state.load(&program).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAB);
    }

    #[test]
    fn test_load_too_large_is_rejected_whole() {
        let mut state = state();
        let program = vec![0xAB; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            state.load(&program),
            Err(Fault::ProgramTooLarge {
                len: 0xE01,
                max: 0xE00
            })
        );
        assert_eq!(state.memory[0x200], 0);
    }

    #[test]
    fn test_read_opcode() {
        let mut state = state();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.read_opcode(0x200), Ok(Opcode(0xAABB)));
    }

    #[test]
    fn test_read_opcode_past_the_end() {
        let state = state();
        assert_eq!(state.read_opcode(0xFFE), Ok(Opcode(0x0000)));
        assert_eq!(
            state.read_opcode(0xFFF),
            Err(Fault::AddressOutOfBounds { addr: 0x1000 })
        );
    }

    #[test]
    fn test_skip_if() {
        let mut state = state();
        state.skip_if(false);
        assert_eq!(state.pc, 0x202);
        state.skip_if(true);
        assert_eq!(state.pc, 0x206);
    }
}
