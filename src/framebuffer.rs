//! The in-memory image of the panel.
//!
//! The buffer uses the controllers' page layout directly, so it can be streamed to display RAM
//! without any conversion: byte `page * width + x` holds pixels `(x, page * 8)` (bit 0) down to
//! `(x, page * 8 + 7)` (bit 7).

use crate::command::consts::{NUM_PIXEL_ROWS, SH1106_COLS};

/// Largest supported width.
pub const MAX_WIDTH: u8 = SH1106_COLS;
/// Largest supported height.
pub const MAX_HEIGHT: u8 = NUM_PIXEL_ROWS;
/// Capacity of every framebuffer; only the first `width * height / 8` bytes are live.
pub const MAX_BUFFER_SIZE: usize = MAX_WIDTH as usize * MAX_HEIGHT as usize / 8;

/// A monochrome pixel value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    /// Pixel off, bit clear.
    Black,
    /// Pixel lit, bit set.
    White,
}

impl Color {
    /// The byte with all 8 pixels of a page column set to this color.
    pub fn fill_byte(self) -> u8 {
        match self {
            Color::Black => 0x00,
            Color::White => 0xFF,
        }
    }
}

/// A page-addressed 1 bit per pixel framebuffer.
#[derive(Clone)]
pub struct FrameBuffer {
    width: u8,
    height: u8,
    buf: [u8; MAX_BUFFER_SIZE],
}

impl FrameBuffer {
    /// Construct a cleared framebuffer for a `width` x `height` panel.
    ///
    /// # Panics
    ///
    /// If the size exceeds `MAX_WIDTH` x `MAX_HEIGHT` or `height` is not a multiple of 8.
    pub fn new(width: u8, height: u8) -> Self {
        if false || width > MAX_WIDTH || height > MAX_HEIGHT || height % 8 != 0 {
            panic!("Framebuffer size not supported.");
        }
        FrameBuffer {
            width,
            height,
            buf: [0; MAX_BUFFER_SIZE],
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of live bytes.
    pub fn size(&self) -> usize {
        self.width as usize * (self.height / 8) as usize
    }

    /// The live bytes, in the order they are streamed to display RAM.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.size()]
    }

    /// Mutable access to the live bytes, for callers that render directly in page layout.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size();
        &mut self.buf[..size]
    }

    /// Byte index and bit mask of an on-screen pixel.
    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let index = (y as usize / 8) * self.width as usize + x as usize;
        Some((index, 1 << (y % 8)))
    }

    /// Set one pixel. Coordinates off the panel are ignored.
    pub fn set_pixel(&mut self, x: i16, y: i16, color: Color) {
        self.plot(x as i32, y as i32, color)
    }

    /// `set_pixel` for intermediate coordinates of the drawing primitives, which may lie far
    /// outside the `i16` range.
    pub(crate) fn plot(&mut self, x: i32, y: i32, color: Color) {
        if let Some((index, mask)) = self.locate(x, y) {
            match color {
                Color::White => self.buf[index] |= mask,
                Color::Black => self.buf[index] &= !mask,
            }
        }
    }

    /// Read one pixel back, or `None` off the panel.
    pub fn pixel(&self, x: i16, y: i16) -> Option<Color> {
        self.locate(x as i32, y as i32).map(|(index, mask)| {
            if self.buf[index] & mask != 0 {
                Color::White
            } else {
                Color::Black
            }
        })
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        let byte = color.fill_byte();
        for b in self.as_bytes_mut() {
            *b = byte;
        }
    }

    /// Flip every pixel.
    pub fn invert(&mut self) {
        for b in self.as_bytes_mut() {
            *b = !*b;
        }
    }

    /// Shift the image `dx` pixels to the right (left when negative). Vacated columns are
    /// cleared.
    pub fn scroll_horizontal(&mut self, dx: i16) {
        let width = self.width as usize;
        let shift = dx.unsigned_abs() as usize;
        if shift == 0 {
            return;
        }
        for row in self.as_bytes_mut().chunks_mut(width) {
            if shift >= width {
                row.iter_mut().for_each(|b| *b = 0);
            } else if dx > 0 {
                row.copy_within(..width - shift, shift);
                row[..shift].iter_mut().for_each(|b| *b = 0);
            } else {
                row.copy_within(shift.., 0);
                row[width - shift..].iter_mut().for_each(|b| *b = 0);
            }
        }
    }

    /// Shift the image `dy` pixels down (up when negative). Vacated rows are cleared.
    pub fn scroll_vertical(&mut self, dy: i16) {
        let width = self.width as usize;
        let pages = (self.height / 8) as usize;
        let shift = dy.unsigned_abs() as u32;
        if shift == 0 {
            return;
        }
        let mask = match self.height {
            64 => u64::MAX,
            h => (1u64 << h) - 1,
        };
        for x in 0..width {
            // Gather the whole column into one word, bit n = row n.
            let column = (0..pages).fold(0u64, |acc, page| {
                acc | (self.buf[page * width + x] as u64) << (page * 8)
            });
            let shifted = if dy > 0 {
                column.checked_shl(shift).unwrap_or(0) & mask
            } else {
                column.checked_shr(shift).unwrap_or(0)
            };
            for page in 0..pages {
                self.buf[page * width + x] = (shifted >> (page * 8)) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_round_trip() {
        let mut fb = FrameBuffer::new(128, 64);
        for &(x, y) in &[(0, 0), (127, 63), (5, 9), (64, 31)] {
            fb.set_pixel(x, y, Color::White);
            assert_eq!(fb.pixel(x, y), Some(Color::White));
            fb.set_pixel(x, y, Color::Black);
            assert_eq!(fb.pixel(x, y), Some(Color::Black));
        }
        // Last write wins.
        fb.set_pixel(3, 3, Color::Black);
        fb.set_pixel(3, 3, Color::White);
        assert_eq!(fb.pixel(3, 3), Some(Color::White));
    }

    #[test]
    fn pixel_page_layout() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.set_pixel(5, 9, Color::White);
        assert_eq!(fb.as_bytes()[128 + 5], 0b0000_0010);
        fb.set_pixel(127, 63, Color::White);
        assert_eq!(fb.as_bytes()[7 * 128 + 127], 0b1000_0000);
        assert_eq!(fb.as_bytes().iter().filter(|b| **b != 0).count(), 2);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.set_pixel(128, 64, Color::White);
        fb.set_pixel(128, 0, Color::White);
        fb.set_pixel(0, 64, Color::White);
        fb.set_pixel(-1, 0, Color::White);
        fb.set_pixel(0, -1, Color::White);
        fb.set_pixel(i16::MIN, i16::MAX, Color::White);
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(fb.pixel(-1, 0), None);
        assert_eq!(fb.pixel(128, 0), None);
    }

    #[test]
    fn fill() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.fill(Color::White);
        let once = fb.as_bytes().to_vec();
        fb.fill(Color::White);
        assert_eq!(fb.as_bytes(), &once[..]);
        assert!(once.iter().all(|b| *b == 0xFF));
        fb.fill(Color::Black);
        assert!(fb.as_bytes().iter().all(|b| *b == 0x00));
    }

    #[test]
    fn smaller_panel_uses_prefix() {
        let mut fb = FrameBuffer::new(128, 32);
        assert_eq!(fb.size(), 512);
        fb.fill(Color::White);
        assert_eq!(fb.as_bytes().len(), 512);
        fb.set_pixel(0, 32, Color::Black);
        assert_eq!(fb.pixel(0, 31), Some(Color::White));
        assert_eq!(fb.pixel(0, 32), None);
    }

    #[test]
    fn invert() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.set_pixel(1, 1, Color::White);
        fb.invert();
        assert_eq!(fb.pixel(1, 1), Some(Color::Black));
        assert_eq!(fb.pixel(0, 0), Some(Color::White));
    }

    #[test]
    fn scroll_horizontal() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.set_pixel(0, 10, Color::White);
        fb.set_pixel(127, 10, Color::White);
        fb.scroll_horizontal(3);
        assert_eq!(fb.pixel(3, 10), Some(Color::White));
        assert_eq!(fb.pixel(0, 10), Some(Color::Black));
        assert_eq!(fb.pixel(127, 10), Some(Color::Black));
        fb.scroll_horizontal(-3);
        assert_eq!(fb.pixel(0, 10), Some(Color::White));
        fb.scroll_horizontal(200);
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn scroll_vertical() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.set_pixel(4, 0, Color::White);
        fb.set_pixel(4, 63, Color::White);
        fb.scroll_vertical(9);
        assert_eq!(fb.pixel(4, 9), Some(Color::White));
        assert_eq!(fb.pixel(4, 0), Some(Color::Black));
        assert_eq!(fb.as_bytes().iter().filter(|b| **b != 0).count(), 1);
        fb.scroll_vertical(-9);
        assert_eq!(fb.pixel(4, 0), Some(Color::White));
        fb.scroll_vertical(-64);
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn scroll_vertical_short_panel() {
        let mut fb = FrameBuffer::new(128, 32);
        fb.set_pixel(0, 30, Color::White);
        fb.scroll_vertical(2);
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
    }
}
