//! Bitmap fonts for the printable ASCII range.
//!
//! Glyph rows are stored as `u16` bitmasks with the leftmost column in bit 15, so a glyph can be
//! up to 16 pixels wide and any number of rows high. Widths never include the spacing column
//! inserted between characters; see `SPACING`.

/// Blank columns between two characters.
pub const SPACING: u8 = 1;

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 126;

/// A compiled-in font. Glyph `c` lives at index `c - 32` for `c` in `32..=126`.
#[derive(Clone, Copy, Debug)]
pub struct Font {
    /// Glyph width of a monospace font, used when `widths` is `None`.
    pub width: u8,
    /// Rows per glyph.
    pub height: u8,
    /// Per-glyph widths of a proportional font.
    pub widths: Option<&'static [u8]>,
    /// Per-glyph vertical shift applied when rendering.
    pub y_offsets: Option<&'static [i8]>,
    /// `height` row bitmasks per glyph, glyphs in character order.
    pub data: &'static [u16],
}

/// A single glyph ready for rasterizing.
#[derive(Clone, Copy, Debug)]
pub struct Glyph {
    pub width: u8,
    pub y_offset: i8,
    pub rows: &'static [u16],
}

fn index(ch: char) -> Option<usize> {
    match ch as u32 {
        c @ FIRST_CHAR..=LAST_CHAR => Some((c - FIRST_CHAR) as usize),
        _ => None,
    }
}

impl Font {
    /// The glyph for `ch`, or `None` for characters outside the printable range (or missing from
    /// a truncated table).
    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        let i = index(ch)?;
        let width = match self.widths {
            Some(widths) => *widths.get(i)?,
            None => self.width,
        };
        let y_offset = self
            .y_offsets
            .and_then(|offsets| offsets.get(i).cloned())
            .unwrap_or(0);
        let height = self.height as usize;
        let rows = self.data.get(i * height..(i + 1) * height)?;
        Some(Glyph {
            width,
            y_offset,
            rows,
        })
    }

    /// Width in pixels of `ch`, not counting spacing. `None` for unprintable characters.
    pub fn char_width(&self, ch: char) -> Option<u8> {
        self.glyph(ch).map(|g| g.width)
    }

    /// Width of `s` as drawn by `Display::write_str`: the glyph widths plus one spacing column
    /// between consecutive characters. Unprintable characters are skipped.
    pub fn string_width(&self, s: &str) -> u16 {
        self.string_width_scaled(s, 1)
    }

    /// Width of `s` drawn with every font pixel enlarged to `scale` x `scale` (0 counts as 1).
    /// Saturates at `u16::MAX`.
    pub fn string_width_scaled(&self, s: &str, scale: u8) -> u16 {
        let scale = scale.max(1) as u16;
        let total = s
            .chars()
            .filter_map(|ch| self.char_width(ch))
            .fold(0u16, |acc, w| {
                acc.saturating_add((w as u16 + SPACING as u16) * scale)
            });
        match total {
            u16::MAX => total,
            _ => total.saturating_sub(SPACING as u16 * scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FONT_6X8, FONT_8H};

    static TINY_ROWS: [u16; 95 * 2] = [0xC000; 95 * 2];
    static TINY_OFFSETS: [i8; 95] = [1; 95];
    static TINY: Font = Font {
        width: 2,
        height: 2,
        widths: None,
        y_offsets: Some(&TINY_OFFSETS),
        data: &TINY_ROWS,
    };

    #[test]
    fn glyph_lookup() {
        let a = FONT_6X8.glyph('A').unwrap();
        assert_eq!(a.width, 5);
        assert_eq!(a.rows.len(), 8);
        assert_eq!(a.rows[0], 0x2000);
        assert!(FONT_6X8.glyph('\n').is_none());
        assert!(FONT_6X8.glyph('\u{7f}').is_none());
        assert!(FONT_6X8.glyph('é').is_none());
        assert!(FONT_6X8.glyph(' ').is_some());
        assert!(FONT_6X8.glyph('~').is_some());
    }

    #[test]
    fn y_offsets() {
        assert_eq!(TINY.glyph('x').unwrap().y_offset, 1);
        assert_eq!(FONT_6X8.glyph('x').unwrap().y_offset, 0);
    }

    #[test]
    fn monospace_string_width() {
        assert_eq!(FONT_6X8.string_width(""), 0);
        assert_eq!(FONT_6X8.string_width("A"), 5);
        for n in 1..20 {
            let s: std::string::String = core::iter::repeat('m').take(n).collect();
            assert_eq!(FONT_6X8.string_width(&s), n as u16 * (5 + 1) - 1);
        }
        assert_eq!(TINY.string_width("abc"), 3 * 3 - 1);
    }

    #[test]
    fn scaled_string_width() {
        assert_eq!(FONT_6X8.string_width_scaled("", 3), 0);
        assert_eq!(FONT_6X8.string_width_scaled("AB", 2), (6 + 6) * 2 - 2);
        assert_eq!(FONT_6X8.string_width_scaled("AB", 0), FONT_6X8.string_width("AB"));
        assert_eq!(FONT_8H.string_width_scaled("iW", 3), (3 + 1 + 5) * 3);
    }

    #[test]
    fn long_strings_saturate() {
        let long: std::string::String = core::iter::repeat('m').take(11_000).collect();
        assert_eq!(FONT_6X8.string_width(&long), u16::MAX);
        assert_eq!(FONT_6X8.string_width_scaled(&long[..5000], 4), u16::MAX);
        assert_eq!(FONT_6X8.string_width(&long[..10_000]), 59_999);
    }

    #[test]
    fn unprintable_characters_do_not_count() {
        assert_eq!(FONT_6X8.string_width("A\nB"), FONT_6X8.string_width("AB"));
        assert_eq!(FONT_6X8.string_width("\t"), 0);
    }

    #[test]
    fn proportional_widths() {
        assert_eq!(FONT_8H.char_width('i'), Some(3));
        assert_eq!(FONT_8H.char_width('W'), Some(5));
        assert_eq!(FONT_8H.char_width(' '), Some(2));
        assert_eq!(FONT_8H.string_width("iW"), 3 + 1 + 5);
        assert!(FONT_8H.string_width("ill") < FONT_6X8.string_width("ill"));
    }

    #[test]
    fn proportional_glyphs_are_left_aligned() {
        for c in (33u8..=126).map(char::from) {
            let g = FONT_8H.glyph(c).unwrap();
            let ink = g.rows.iter().fold(0u16, |acc, r| acc | r);
            assert!(ink & 0x8000 != 0, "glyph {:?} not left aligned", c);
            assert_eq!(ink & (0xFFFF >> g.width), 0, "glyph {:?} wider than {}", c, g.width);
        }
    }
}
