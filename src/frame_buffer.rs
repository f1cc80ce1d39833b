use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// # Frame Buffer
/// The Chip-8 display is 64x32 black/white pixels with the origin at the top left.
///
/// Each row is packed into a `u64` with the most significant bit as column 0, so a
/// sprite row can be positioned with a single rotate; rotating also gives the
/// horizontal wraparound for free.
///
/// The buffer tracks whether it changed since it was last rendered so that a
/// display only gets a call to `render` when there's something new to show.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    rows: [u64; DISPLAY_HEIGHT],
    dirty: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            rows: [0; DISPLAY_HEIGHT],
            dirty: false,
        }
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.rows = [0; DISPLAY_HEIGHT];
        self.dirty = true;
    }

    /// XORs a sprite onto the buffer with its top left corner at `x`, `y`.
    ///
    /// Each byte of `sprite` is one row, most significant bit leftmost. Rows that run
    /// off the bottom continue at the top and columns that run off the right continue
    /// on the left.
    ///
    /// Returns true if any pixel that was on got turned off, across the whole sprite.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let shift = (x as usize % DISPLAY_WIDTH) as u32;
        let top = y as usize % DISPLAY_HEIGHT;
        let mut collided = false;

        for (i, &byte) in sprite.iter().enumerate() {
            let row = &mut self.rows[(top + i) % DISPLAY_HEIGHT];
            let pixels = (u64::from(byte) << (DISPLAY_WIDTH - 8)).rotate_right(shift);
            collided |= *row & pixels != 0;
            *row ^= pixels;
        }

        self.dirty = true;
        collided
    }

    /// Whether the pixel at `x`, `y` is on. Coordinates wrap like the blit does.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let row = self.rows[y % DISPLAY_HEIGHT];
        row & (1 << (DISPLAY_WIDTH - 1 - x % DISPLAY_WIDTH)) != 0
    }

    /// Rows top to bottom, column 0 in the most significant bit.
    pub fn rows(&self) -> &[u64; DISPLAY_HEIGHT] {
        &self.rows
    }

    /// The buffer as 256 bytes of video memory: 8 bytes per row, MSB-first.
    pub fn to_bytes(&self) -> [u8; DISPLAY_WIDTH * DISPLAY_HEIGHT / 8] {
        let mut bytes = [0; DISPLAY_WIDTH * DISPLAY_HEIGHT / 8];
        for (chunk, row) in bytes.chunks_exact_mut(DISPLAY_WIDTH / 8).zip(self.rows.iter()) {
            chunk.copy_from_slice(&row.to_be_bytes());
        }
        bytes
    }

    pub fn lit_pixels(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// Two frames are the same picture regardless of whether either has been rendered.
impl PartialEq for FrameBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl Eq for FrameBuffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_msb_first() {
        let mut frame = FrameBuffer::new();
        let collided = frame.draw_sprite(&[0b1010_0000], 8, 2);
        assert!(!collided);
        assert!(frame.pixel(8, 2));
        assert!(!frame.pixel(9, 2));
        assert!(frame.pixel(10, 2));
        assert_eq!(frame.lit_pixels(), 2);
    }

    #[test]
    fn test_full_byte_twice_collides_and_erases() {
        let mut frame = FrameBuffer::new();
        assert!(!frame.draw_sprite(&[0xFF], 0, 0));
        assert_eq!(frame.rows()[0], 0xFF00_0000_0000_0000);
        assert!(frame.draw_sprite(&[0xFF], 0, 0));
        assert_eq!(frame.lit_pixels(), 0);
    }

    #[test]
    fn test_unaligned_sprite_splits_across_bytes() {
        let mut frame = FrameBuffer::new();
        frame.draw_sprite(&[0b1010_1011], 2, 0);
        let bytes = frame.to_bytes();
        assert_eq!(bytes[0], 0b0010_1010);
        assert_eq!(bytes[1], 0b1100_0000);
        assert_eq!(bytes[2], 0);
    }

    #[test]
    fn test_wraps_horizontally() {
        let mut frame = FrameBuffer::new();
        frame.draw_sprite(&[0xFF], 60, 0);
        for x in 60..64 {
            assert!(frame.pixel(x, 0));
        }
        for x in 0..4 {
            assert!(frame.pixel(x, 0));
        }
        assert!(!frame.pixel(4, 0));
        assert_eq!(frame.lit_pixels(), 8);
    }

    #[test]
    fn test_wraps_vertically() {
        let mut frame = FrameBuffer::new();
        frame.draw_sprite(&[0x80, 0x80, 0x80], 0, 31);
        assert!(frame.pixel(0, 31));
        assert!(frame.pixel(0, 0));
        assert!(frame.pixel(0, 1));
        assert!(!frame.pixel(0, 2));
    }

    #[test]
    fn test_coordinates_past_the_screen_wrap() {
        let mut frame = FrameBuffer::new();
        // 0x45 = 69 -> column 5, 0x22 = 34 -> row 2
        frame.draw_sprite(&[0x80], 0x45, 0x22);
        assert!(frame.pixel(5, 2));
        assert_eq!(frame.lit_pixels(), 1);
    }

    #[test]
    fn test_collision_is_union_of_rows() {
        let mut frame = FrameBuffer::new();
        frame.draw_sprite(&[0x80], 0, 0);
        // first row collides, second doesn't; the flag must still be set
        assert!(frame.draw_sprite(&[0x80, 0x80], 0, 0));
        assert!(!frame.pixel(0, 0));
        assert!(frame.pixel(0, 1));
    }

    #[test]
    fn test_xor_leaves_unrelated_pixels() {
        let mut frame = FrameBuffer::new();
        frame.draw_sprite(&[0b0101_0000], 2, 0);
        frame.draw_sprite(&[0b1100_0000], 2, 0);
        assert!(frame.pixel(2, 0));
        assert!(!frame.pixel(3, 0));
        assert!(!frame.pixel(4, 0));
        assert!(frame.pixel(5, 0));
    }

    #[test]
    fn test_clear_and_dirty_flag() {
        let mut frame = FrameBuffer::new();
        assert!(!frame.is_dirty());
        frame.draw_sprite(&[0xFF, 0xFF], 30, 30);
        assert!(frame.is_dirty());
        frame.mark_clean();
        frame.clear();
        assert!(frame.is_dirty());
        assert_eq!(frame, FrameBuffer::new());
        assert_eq!(frame.to_bytes(), [0; 256]);
    }
}
