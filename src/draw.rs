//! Drawing primitives on the framebuffer. All of them clip against the panel, so shapes may
//! extend past the edges. Coordinates are widened to `i32` internally; nothing wraps back onto
//! the panel however far off screen a shape reaches.

use core::cmp::{max, min};
use core::mem::swap;

use itertools::iproduct;

use crate::font::Glyph;
use crate::framebuffer::{Color, FrameBuffer};

impl FrameBuffer {
    /// Draw a line from `(x0, y0)` to `(x1, y1)` inclusive (Bresenham).
    pub fn draw_line(&mut self, x0: i16, y0: i16, x1: i16, y1: i16, color: Color) {
        self.line(x0 as i32, y0 as i32, x1 as i32, y1 as i32, color)
    }

    /// Draw `len` pixels to the right of `(x, y)`, including it.
    pub fn draw_hline(&mut self, x: i16, y: i16, len: u16, color: Color) {
        if len > 0 {
            let x = x as i32;
            self.hspan(x, x + len as i32 - 1, y as i32, color);
        }
    }

    /// Draw `len` pixels below `(x, y)`, including it.
    pub fn draw_vline(&mut self, x: i16, y: i16, len: u16, color: Color) {
        if len > 0 {
            let y = y as i32;
            self.vspan(x as i32, y, y + len as i32 - 1, color);
        }
    }

    /// Draw the outline of a `w` x `h` rectangle with its top left corner at `(x, y)`. An empty
    /// rectangle draws nothing.
    pub fn draw_rectangle(&mut self, x: i16, y: i16, w: u16, h: u16, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        let (x, y) = (x as i32, y as i32);
        let right = x + w as i32 - 1;
        let bottom = y + h as i32 - 1;
        self.hspan(x, right, y, color);
        self.hspan(x, right, bottom, color);
        self.vspan(x, y, bottom, color);
        self.vspan(right, y, bottom, color);
    }

    /// Fill a `w` x `h` rectangle with its top left corner at `(x, y)`.
    pub fn fill_rectangle(&mut self, x: i16, y: i16, w: u16, h: u16, color: Color) {
        self.fill_rect(x as i32, y as i32, w as i32, h as i32, color)
    }

    /// Draw a circle outline (midpoint algorithm). Radius 0 is a single pixel.
    pub fn draw_circle(&mut self, x0: i16, y0: i16, r: u16, color: Color) {
        let (cx, cy, r) = (x0 as i32, y0 as i32, r as i32);
        let mut plot = |dx: i32, dy: i32| self.plot(cx + dx, cy + dy, color);
        plot(0, r);
        plot(0, -r);
        plot(r, 0);
        plot(-r, 0);

        let mut f = 1 - r;
        let mut dd_f_x = 1;
        let mut dd_f_y = -2 * r;
        let mut x = 0;
        let mut y = r;
        while x < y {
            if f >= 0 {
                y -= 1;
                dd_f_y += 2;
                f += dd_f_y;
            }
            x += 1;
            dd_f_x += 2;
            f += dd_f_x;

            plot(x, y);
            plot(-x, y);
            plot(x, -y);
            plot(-x, -y);
            plot(y, x);
            plot(-y, x);
            plot(y, -x);
            plot(-y, -x);
        }
    }

    /// Fill a circle with vertical spans, one per symmetric octant pair.
    pub fn fill_circle(&mut self, x0: i16, y0: i16, r: u16, color: Color) {
        let (cx, cy, r) = (x0 as i32, y0 as i32, r as i32);
        let mut span = |x: i32, dy: i32| self.vspan(x, cy - dy, cy + dy, color);
        span(cx, r);

        let mut f = 1 - r;
        let mut dd_f_x = 1;
        let mut dd_f_y = -2 * r;
        let mut x = 0;
        let mut y = r;
        while x < y {
            if f >= 0 {
                y -= 1;
                dd_f_y += 2;
                f += dd_f_y;
            }
            x += 1;
            dd_f_x += 2;
            f += dd_f_x;

            span(cx + x, y);
            span(cx - x, y);
            span(cx + y, x);
            span(cx - y, x);
        }
    }

    /// Draw the outline of the triangle through three points.
    pub fn draw_triangle(&mut self, p0: (i16, i16), p1: (i16, i16), p2: (i16, i16), color: Color) {
        self.draw_line(p0.0, p0.1, p1.0, p1.1, color);
        self.draw_line(p1.0, p1.1, p2.0, p2.1, color);
        self.draw_line(p2.0, p2.1, p0.0, p0.1, color);
    }

    /// Fill the triangle through three points with horizontal spans.
    pub fn fill_triangle(&mut self, p0: (i16, i16), p1: (i16, i16), p2: (i16, i16), color: Color) {
        let (mut x0, mut y0) = (p0.0 as i64, p0.1 as i64);
        let (mut x1, mut y1) = (p1.0 as i64, p1.1 as i64);
        let (mut x2, mut y2) = (p2.0 as i64, p2.1 as i64);

        // Sort by y so that y0 <= y1 <= y2.
        if y0 > y1 {
            swap(&mut y0, &mut y1);
            swap(&mut x0, &mut x1);
        }
        if y1 > y2 {
            swap(&mut y1, &mut y2);
            swap(&mut x1, &mut x2);
        }
        if y0 > y1 {
            swap(&mut y0, &mut y1);
            swap(&mut x0, &mut x1);
        }

        if y0 == y2 {
            let a = min(x0, min(x1, x2));
            let b = max(x0, max(x1, x2));
            self.hspan(a as i32, b as i32, y0 as i32, color);
            return;
        }

        // Rows down to `upper_end` span edges 0-1 and 0-2, the rest edges 1-2 and 0-2. Row y1
        // belongs to the upper part only when the lower part is empty.
        let upper_end = if y1 == y2 { y1 } else { y1 - 1 };
        let first = max(y0, 0);
        let last = min(y2, self.height() as i64 - 1);
        for y in first..=last {
            let b = x0 + (x2 - x0) * (y - y0) / (y2 - y0);
            let a = if y <= upper_end {
                x0 + (x1 - x0) * (y - y0) / (y1 - y0)
            } else {
                x1 + (x2 - x1) * (y - y1) / (y2 - y1)
            };
            self.hspan(a as i32, b as i32, y as i32, color);
        }
    }

    /// Draw a 1 bit per pixel image, MSB first, rows padded to whole bytes. Only set bits are
    /// drawn; missing trailing data counts as clear bits.
    pub fn draw_bitmap(&mut self, x: i16, y: i16, data: &[u8], w: u16, h: u16, color: Color) {
        self.blit(x, y, data, w, h, color, |i| 0x80 >> (i % 8));
    }

    /// Draw an XBM image: like `draw_bitmap`, but LSB first.
    pub fn draw_xbm(&mut self, x: i16, y: i16, data: &[u8], w: u16, h: u16, color: Color) {
        self.blit(x, y, data, w, h, color, |i| 1 << (i % 8));
    }

    /// Draw a `w` x `h` frame filled from the left by `percent` (capped at 100) of its inner
    /// width.
    pub fn draw_progress_bar(&mut self, x: i16, y: i16, w: u16, h: u16, percent: u8, color: Color) {
        self.draw_rectangle(x, y, w, h, color);
        let inner = w.saturating_sub(2) as u32 * percent.min(100) as u32 / 100;
        self.fill_rect(x as i32 + 1, y as i32 + 1, inner as i32, h as i32 - 2, color);
    }

    /// Plot `data` as a line graph `h` pixels tall with its baseline at `y + h`, one sample per
    /// column starting at `x`. A sample of `full_scale` reaches the top. A `full_scale` of 0
    /// counts as 1, and fewer than two samples draw nothing.
    pub fn draw_graph(&mut self, x: i16, y: i16, data: &[u8], full_scale: u8, h: u16, color: Color) {
        let (x, base, h) = (x as i32, y as i32 + h as i32, h as i32);
        let full_scale = full_scale.max(1) as i32;
        let level = |v: u8| base - v as i32 * h / full_scale;
        let visible = (self.width() as i32 - x).max(0) as usize;
        for (i, pair) in data.windows(2).enumerate().take(visible) {
            let px = x + i as i32;
            self.line(px, level(pair[0]), px + 1, level(pair[1]), color);
        }
    }

    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x).abs();
        let dy = (y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Row `y` from `x0` to `x1` inclusive, either order, clipped to the panel.
    fn hspan(&mut self, x0: i32, x1: i32, y: i32, color: Color) {
        if y < 0 || y >= self.height() as i32 {
            return;
        }
        let start = min(x0, x1).max(0);
        let end = max(x0, x1).min(self.width() as i32 - 1);
        for x in start..=end {
            self.plot(x, y, color);
        }
    }

    /// Column `x` from `y0` to `y1` inclusive, either order, clipped to the panel.
    fn vspan(&mut self, x: i32, y0: i32, y1: i32, color: Color) {
        if x < 0 || x >= self.width() as i32 {
            return;
        }
        let start = min(y0, y1).max(0);
        let end = max(y0, y1).min(self.height() as i32 - 1);
        for y in start..=end {
            self.plot(x, y, color);
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        let first = y.max(0);
        let last = (y + h - 1).min(self.height() as i32 - 1);
        for row in first..=last {
            self.hspan(x, x + w - 1, row, color);
        }
    }

    fn blit<F>(&mut self, x: i16, y: i16, data: &[u8], w: u16, h: u16, color: Color, mask: F)
    where
        F: Fn(u16) -> u8,
    {
        let (x, y) = (x as i32, y as i32);
        let stride = (w as usize + 7) / 8;
        // Only the part of the image that overlaps the panel.
        let clip = |offset: i32, size: u16, limit: u8| {
            let size = size as i32;
            (-offset).clamp(0, size) as u16..(limit as i32 - offset).clamp(0, size) as u16
        };
        let cols = clip(x, w, self.width());
        let rows = clip(y, h, self.height());
        for (j, i) in iproduct!(rows, cols) {
            let byte = data
                .get(j as usize * stride + i as usize / 8)
                .cloned()
                .unwrap_or(0);
            if byte & mask(i) != 0 {
                self.plot(x + i as i32, y + j as i32, color);
            }
        }
    }

    /// Rasterize the foreground of `glyph` with its top left corner at `(x, y)`, each font
    /// pixel drawn as a `scale` x `scale` block. Blocks off the panel are clipped individually.
    pub(crate) fn draw_glyph(&mut self, x: i32, y: i32, glyph: &Glyph, scale: u8, color: Color) {
        let s = scale.max(1) as i32;
        let width = glyph.width.min(16) as i32;
        for (row, bits) in glyph.rows.iter().enumerate() {
            let py = y + (glyph.y_offset as i32 + row as i32) * s;
            if py + s <= 0 || py >= self.height() as i32 {
                continue;
            }
            for col in 0..width {
                if bits & (0x8000 >> col) != 0 {
                    self.fill_rect(x + col * s, py, s, s, color);
                }
            }
        }
    }
}
