//! The main API to the display driver. A `Display` owns the bus interface, the framebuffer that
//! all drawing goes into, and the streaming state that pushes that framebuffer to the panel.
//!
//! Drawing never touches the bus. The framebuffer reaches the panel either all at once with
//! `update_screen`, or a bounded number of bytes at a time with `tick` (or `update_screen_chunk`
//! for callers that track progress themselves).

pub mod stream;

use self::stream::{segments, Segment, UpdateCursor};
use crate::command::{AddressMode, Command};
use crate::config::{Config, Controller, Geometry};
use crate::error::Error;
use crate::font::{Font, SPACING};
use crate::framebuffer::{Color, FrameBuffer};
use crate::interface;
use core::ops::Range;

/// Whether the panel has been initialized, and if so whether it is lit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// `init` has not completed yet.
    Uninitialized,
    On,
    Off,
}

/// A driver for an SSD1306 or SH1106 display.
pub struct Display<DI>
where
    DI: interface::DisplayInterface,
{
    iface: DI,
    config: Config,
    fb: FrameBuffer,
    cursor: (i16, u8),
    update: UpdateCursor,
    inverted: bool,
    power: PowerState,
}

impl<DI> Display<DI>
where
    DI: interface::DisplayInterface,
{
    /// Construct a new display driver for the panel described by `config`, connected to the
    /// interface `iface`. Nothing is sent until `init`.
    ///
    /// # Panics
    ///
    /// If the configured size and column offset cannot be shown by the controller: the height
    /// must be a multiple of 8 in 16..=64, and the column offset plus width must fit the
    /// controller RAM (128 columns for the SSD1306, 132 for the SH1106).
    pub fn new(iface: DI, config: Config) -> Self {
        let geometry = config.geometry();
        if false || !geometry.is_supported() {
            panic!("Display size or column offset not supported by controller.");
        }
        Display {
            iface,
            config,
            fb: FrameBuffer::new(geometry.width, geometry.height),
            cursor: (0, 0),
            update: UpdateCursor::new(geometry.buffer_size(), config.transfer_pow),
            inverted: config.inverted,
            power: PowerState::Uninitialized,
        }
    }

    /// Program the controller registers, then clear the framebuffer and the panel.
    ///
    /// On error the panel is in an unknown state, but the driver is intact and `init` may be
    /// called again.
    pub fn init(&mut self) -> Result<(), Error<DI::Error>> {
        let g = self.config.geometry();
        debug!("init {} {=u8}x{=u8}", g.controller, g.width, g.height);

        Command::DisplayOn(false).send(&mut self.iface)?;
        self.config.send_clock(&mut self.iface)?;
        Command::Multiplex(g.height).send(&mut self.iface)?;
        Command::DisplayOffset(0).send(&mut self.iface)?;
        Command::StartLine(0).send(&mut self.iface)?;
        match g.controller {
            Controller::Ssd1306 => {
                Command::ChargePump(true).send(&mut self.iface)?;
                Command::AddressMode(AddressMode::Horizontal).send(&mut self.iface)?;
                Command::ColumnRange(g.column_offset, g.last_column()).send(&mut self.iface)?;
                Command::PageRange(0, g.pages() - 1).send(&mut self.iface)?;
            }
            Controller::Sh1106 => Command::DcDc(true).send(&mut self.iface)?,
        }
        // Both controllers scan right to left and bottom to top out of reset.
        Command::SegmentRemap(!self.config.mirror_horizontal).send(&mut self.iface)?;
        Command::ComScanReversed(!self.config.mirror_vertical).send(&mut self.iface)?;
        self.config.send_analog(&mut self.iface)?;
        Command::AllOn(false).send(&mut self.iface)?;
        Command::Invert(self.config.inverted).send(&mut self.iface)?;
        Command::DisplayOn(true).send(&mut self.iface)?;
        self.inverted = self.config.inverted;
        self.power = PowerState::On;

        self.fb.fill(Color::Black);
        self.update_screen()
    }

    /// Consume the driver and return the interface.
    pub fn release(self) -> DI {
        self.iface
    }

    /// The panel geometry.
    pub fn geometry(&self) -> Geometry {
        self.config.geometry()
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    /// Turn the panel on. The display RAM is retained while off.
    pub fn on(&mut self) -> Result<(), Error<DI::Error>> {
        Command::DisplayOn(true).send(&mut self.iface)?;
        self.power = PowerState::On;
        Ok(())
    }

    /// Turn the panel off.
    pub fn off(&mut self) -> Result<(), Error<DI::Error>> {
        Command::DisplayOn(false).send(&mut self.iface)?;
        self.power = PowerState::Off;
        Ok(())
    }

    /// Whether the panel currently shows lit pixels as dark.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Flip between normal and inverse video. The framebuffer is unchanged.
    pub fn toggle_invert(&mut self) -> Result<(), Error<DI::Error>> {
        let inverted = !self.inverted;
        self.set_invert(inverted)
    }

    pub fn set_invert(&mut self, inverted: bool) -> Result<(), Error<DI::Error>> {
        Command::Invert(inverted).send(&mut self.iface)?;
        self.inverted = inverted;
        Ok(())
    }

    /// Set the raw contrast register.
    pub fn set_brightness(&mut self, contrast: u8) -> Result<(), Error<DI::Error>> {
        Command::Contrast(contrast).send(&mut self.iface)
    }

    // Framebuffer access and drawing. None of these touch the bus.

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn framebuffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.fb
    }

    /// The raw page-layout bytes, as streamed to the panel.
    pub fn buffer(&self) -> &[u8] {
        self.fb.as_bytes()
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.fb.as_bytes_mut()
    }

    pub fn fill(&mut self, color: Color) {
        self.fb.fill(color)
    }

    pub fn clear(&mut self) {
        self.fb.fill(Color::Black)
    }

    pub fn draw_pixel(&mut self, x: i16, y: i16, color: Color) {
        self.fb.set_pixel(x, y, color)
    }

    pub fn pixel(&self, x: i16, y: i16) -> Option<Color> {
        self.fb.pixel(x, y)
    }

    pub fn draw_line(&mut self, x0: i16, y0: i16, x1: i16, y1: i16, color: Color) {
        self.fb.draw_line(x0, y0, x1, y1, color)
    }

    pub fn draw_hline(&mut self, x: i16, y: i16, len: u16, color: Color) {
        self.fb.draw_hline(x, y, len, color)
    }

    pub fn draw_vline(&mut self, x: i16, y: i16, len: u16, color: Color) {
        self.fb.draw_vline(x, y, len, color)
    }

    pub fn draw_rectangle(&mut self, x: i16, y: i16, w: u16, h: u16, color: Color) {
        self.fb.draw_rectangle(x, y, w, h, color)
    }

    pub fn fill_rectangle(&mut self, x: i16, y: i16, w: u16, h: u16, color: Color) {
        self.fb.fill_rectangle(x, y, w, h, color)
    }

    pub fn draw_circle(&mut self, x0: i16, y0: i16, r: u16, color: Color) {
        self.fb.draw_circle(x0, y0, r, color)
    }

    pub fn fill_circle(&mut self, x0: i16, y0: i16, r: u16, color: Color) {
        self.fb.fill_circle(x0, y0, r, color)
    }

    pub fn draw_triangle(&mut self, p0: (i16, i16), p1: (i16, i16), p2: (i16, i16), color: Color) {
        self.fb.draw_triangle(p0, p1, p2, color)
    }

    pub fn fill_triangle(&mut self, p0: (i16, i16), p1: (i16, i16), p2: (i16, i16), color: Color) {
        self.fb.fill_triangle(p0, p1, p2, color)
    }

    /// Draw an MSB-first bitmap. See `FrameBuffer::draw_bitmap`.
    pub fn draw_bitmap(&mut self, x: i16, y: i16, data: &[u8], w: u16, h: u16, color: Color) {
        self.fb.draw_bitmap(x, y, data, w, h, color)
    }

    /// Draw an LSB-first XBM image. See `FrameBuffer::draw_xbm`.
    pub fn draw_xbm(&mut self, x: i16, y: i16, data: &[u8], w: u16, h: u16, color: Color) {
        self.fb.draw_xbm(x, y, data, w, h, color)
    }

    /// Draw a framed bar filled to `percent`. See `FrameBuffer::draw_progress_bar`.
    pub fn draw_progress_bar(&mut self, x: i16, y: i16, w: u16, h: u16, percent: u8, color: Color) {
        self.fb.draw_progress_bar(x, y, w, h, percent, color)
    }

    /// Plot samples as a line graph. See `FrameBuffer::draw_graph`.
    pub fn draw_graph(&mut self, x: i16, y: i16, data: &[u8], full_scale: u8, h: u16, color: Color) {
        self.fb.draw_graph(x, y, data, full_scale, h, color)
    }

    /// Flip every pixel in the framebuffer. Unlike `toggle_invert` this changes the image data.
    pub fn invert_pixels(&mut self) {
        self.fb.invert()
    }

    pub fn scroll_horizontal(&mut self, dx: i16) {
        self.fb.scroll_horizontal(dx)
    }

    pub fn scroll_vertical(&mut self, dy: i16) {
        self.fb.scroll_vertical(dy)
    }

    // Text.

    /// Move the text cursor. `x` may be negative to start a string partly off the left edge.
    pub fn set_cursor(&mut self, x: i16, y: u8) {
        self.cursor = (x, y);
    }

    pub fn cursor(&self) -> (i16, u8) {
        self.cursor
    }

    /// Draw `ch` with its top left corner at the cursor and advance the cursor by the glyph
    /// width plus one spacing column. Only the glyph foreground is drawn, and any part of it
    /// off the panel is clipped.
    ///
    /// Returns `None` without moving the cursor if `font` has no glyph for `ch`. A printable
    /// character that is clipped entirely still advances the cursor.
    pub fn write_char(&mut self, ch: char, font: &Font, color: Color) -> Option<char> {
        self.write_char_scaled(ch, font, 1, color)
    }

    /// `write_char` with every font pixel drawn as a `scale` x `scale` block; the advance
    /// scales too. A scale of 0 counts as 1.
    pub fn write_char_scaled(
        &mut self,
        ch: char,
        font: &Font,
        scale: u8,
        color: Color,
    ) -> Option<char> {
        let glyph = font.glyph(ch)?;
        let scale = scale.max(1);
        let (x, y) = self.cursor;
        self.fb.draw_glyph(x as i32, y as i32, &glyph, scale, color);
        let advance = (glyph.width as i32 + SPACING as i32) * scale as i32;
        self.cursor.0 = (x as i32 + advance).min(i16::MAX as i32) as i16;
        Some(ch)
    }

    /// Write every character of `s` at the cursor. Returns the number of characters drawn,
    /// saturating at `u16::MAX`; characters without a glyph are skipped.
    pub fn write_str(&mut self, s: &str, font: &Font, color: Color) -> u16 {
        self.write_str_scaled(s, font, 1, color)
    }

    /// `write_str` using `write_char_scaled`.
    pub fn write_str_scaled(&mut self, s: &str, font: &Font, scale: u8, color: Color) -> u16 {
        let mut drawn: u16 = 0;
        for ch in s.chars() {
            if self.write_char_scaled(ch, font, scale, color).is_some() {
                drawn = drawn.saturating_add(1);
            }
        }
        drawn
    }

    /// Move the cursor to `(x, y)`, then `write_str`.
    pub fn write_str_at(&mut self, x: i16, y: u8, s: &str, font: &Font, color: Color) -> u16 {
        self.set_cursor(x, y);
        self.write_str(s, font, color)
    }

    /// The horizontal advance `write_str` would produce for `s`, without the trailing spacing.
    pub fn string_width(&self, s: &str, font: &Font) -> u16 {
        font.string_width(s)
    }

    /// `string_width` for text drawn with `write_str_scaled`.
    pub fn string_width_scaled(&self, s: &str, font: &Font, scale: u8) -> u16 {
        font.string_width_scaled(s, scale)
    }

    // Streaming.

    /// Send the whole framebuffer. On success the incremental update cursor restarts at 0, since
    /// everything it would send next is already on the panel.
    pub fn update_screen(&mut self) -> Result<(), Error<DI::Error>> {
        let g = self.config.geometry();
        match g.controller {
            Controller::Ssd1306 => {
                Command::ColumnRange(g.column_offset, g.last_column()).send(&mut self.iface)?;
                Command::PageRange(0, g.pages() - 1).send(&mut self.iface)?;
                self.iface
                    .send_data(self.fb.as_bytes())
                    .map_err(Error::Interface)?;
            }
            Controller::Sh1106 => {
                let width = g.width as usize;
                for page in 0..g.pages() {
                    let start = page as usize * width;
                    self.send_segment(Segment {
                        page,
                        column: 0,
                        bytes: start..start + width,
                    })?;
                }
            }
        }
        self.update.reset();
        Ok(())
    }

    /// Send chunk `index` of the framebuffer, `bytes_per_op` bytes long (the last chunk may be
    /// shorter). Returns whether chunks remain after this one. An index past the end sends
    /// nothing and returns `Ok(false)`.
    ///
    /// This ignores the update cursor used by `tick`.
    pub fn update_screen_chunk(&mut self, index: usize) -> Result<bool, Error<DI::Error>> {
        match self.update.chunk(index) {
            Some(span) => {
                self.send_span(span)?;
                Ok(index + 1 < self.update.total_chunks())
            }
            None => Ok(false),
        }
    }

    /// Number of chunks `update_screen_chunk` splits the framebuffer into.
    pub fn total_chunks(&self) -> usize {
        self.update.total_chunks()
    }

    /// Send the next `bytes_per_op` bytes of the framebuffer, continuing where the previous tick
    /// stopped and wrapping to the start after the last byte.
    ///
    /// If the transfer fails the cursor stays put, so the next tick retries the same bytes.
    pub fn tick(&mut self) -> Result<(), Error<DI::Error>> {
        self.step().map(|_| ())
    }

    /// Tick once, returning `Ok` when this tick sent the last bytes of the framebuffer and
    /// `WouldBlock` otherwise. `nb::block!(display.refresh())` therefore streams exactly one full
    /// frame from wherever the cursor stands.
    pub fn refresh(&mut self) -> nb::Result<(), Error<DI::Error>> {
        match self.step() {
            Ok(true) => Ok(()),
            Ok(false) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    /// Byte offset the next `tick` starts at.
    pub fn update_cursor(&self) -> usize {
        self.update.offset()
    }

    /// Set the update granularity to `1 << pow` bytes, clamped between 1 byte and the whole
    /// framebuffer. Returns the exponent in effect.
    pub fn set_transfer_pow(&mut self, pow: u8) -> u8 {
        self.update.set_pow(pow)
    }

    pub fn transfer_pow(&self) -> u8 {
        self.update.pow()
    }

    pub fn bytes_per_op(&self) -> usize {
        self.update.bytes_per_op()
    }

    /// One tick. Returns whether the cursor wrapped.
    fn step(&mut self) -> Result<bool, Error<DI::Error>> {
        let span = self.update.next();
        let len = span.len();
        if let Err(e) = self.send_span(span.clone()) {
            warn!("update at offset {=usize} failed, retrying", span.start);
            return Err(e);
        }
        trace!("sent {=usize} bytes at {=usize}", len, span.start);
        Ok(self.update.advance(len))
    }

    fn send_span(&mut self, span: Range<usize>) -> Result<(), Error<DI::Error>> {
        for segment in segments(span, self.config.geometry().width) {
            self.send_segment(segment)?;
        }
        Ok(())
    }

    /// Point the controller at the first byte of `segment` and send it.
    fn send_segment(&mut self, segment: Segment) -> Result<(), Error<DI::Error>> {
        let g = self.config.geometry();
        let column = segment.column + g.column_offset;
        match g.controller {
            Controller::Ssd1306 => {
                Command::ColumnRange(column, g.last_column()).send(&mut self.iface)?;
                Command::PageRange(segment.page, g.pages() - 1).send(&mut self.iface)?;
            }
            Controller::Sh1106 => {
                Command::PageStart(segment.page).send(&mut self.iface)?;
                Command::ColumnStart(column).send(&mut self.iface)?;
            }
        }
        self.iface
            .send_data(&self.fb.as_bytes()[segment.bytes])
            .map_err(Error::Interface)
    }
}
