//! Built-in fonts covering printable ASCII (32..=126).
//!
//! Both fonts share the same 5x7 glyph shapes (with descenders reaching the eighth row).
//! `FONT_6X8` keeps every glyph 5 columns wide, giving a 6 pixel character cell once the
//! inter-character spacing column is added. `FONT_8H` trims each glyph to its inked columns.

use crate::font::Font;

/// Monospace font: 5 pixel glyphs on an 8 pixel line, 6 pixel advance.
pub static FONT_6X8: Font = Font {
    width: 5,
    height: 8,
    widths: None,
    y_offsets: None,
    data: &FONT_6X8_DATA,
};

/// Proportional font, 8 pixels high.
pub static FONT_8H: Font = Font {
    width: 5,
    height: 8,
    widths: Some(&FONT_8H_WIDTHS),
    y_offsets: None,
    data: &FONT_8H_DATA,
};

#[rustfmt::skip]
static FONT_6X8_DATA: [u16; 95 * 8] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // space
    0x2000, 0x2000, 0x2000, 0x2000, 0x2000, 0x0000, 0x2000, 0x0000, // !
    0x5000, 0x5000, 0x5000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // "
    0x5000, 0x5000, 0xF800, 0x5000, 0xF800, 0x5000, 0x5000, 0x0000, // #
    0x2000, 0x7800, 0xA000, 0x7000, 0x2800, 0xF000, 0x2000, 0x0000, // $
    0xC000, 0xC800, 0x1000, 0x2000, 0x4000, 0x9800, 0x1800, 0x0000, // %
    0x4000, 0xA000, 0xA000, 0x4000, 0xA800, 0x9000, 0x6800, 0x0000, // &
    0x3000, 0x3000, 0x2000, 0x4000, 0x0000, 0x0000, 0x0000, 0x0000, // quote
    0x1000, 0x2000, 0x4000, 0x4000, 0x4000, 0x2000, 0x1000, 0x0000, // (
    0x4000, 0x2000, 0x1000, 0x1000, 0x1000, 0x2000, 0x4000, 0x0000, // )
    0x2000, 0xA800, 0x7000, 0xF800, 0x7000, 0xA800, 0x2000, 0x0000, // *
    0x0000, 0x2000, 0x2000, 0xF800, 0x2000, 0x2000, 0x0000, 0x0000, // +
    0x0000, 0x0000, 0x0000, 0x0000, 0x3000, 0x3000, 0x2000, 0x4000, // ,
    0x0000, 0x0000, 0x0000, 0xF800, 0x0000, 0x0000, 0x0000, 0x0000, // -
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x3000, 0x3000, 0x0000, // .
    0x0000, 0x0800, 0x1000, 0x2000, 0x4000, 0x8000, 0x0000, 0x0000, // /
    0x7000, 0x8800, 0x9800, 0xA800, 0xC800, 0x8800, 0x7000, 0x0000, // 0
    0x2000, 0x6000, 0x2000, 0x2000, 0x2000, 0x2000, 0x7000, 0x0000, // 1
    0x7000, 0x8800, 0x0800, 0x7000, 0x8000, 0x8000, 0xF800, 0x0000, // 2
    0xF800, 0x0800, 0x1000, 0x3000, 0x0800, 0x8800, 0x7000, 0x0000, // 3
    0x1000, 0x3000, 0x5000, 0x9000, 0xF800, 0x1000, 0x1000, 0x0000, // 4
    0xF800, 0x8000, 0xF000, 0x0800, 0x0800, 0x8800, 0x7000, 0x0000, // 5
    0x3800, 0x4000, 0x8000, 0xF000, 0x8800, 0x8800, 0x7000, 0x0000, // 6
    0xF800, 0x0800, 0x0800, 0x1000, 0x2000, 0x4000, 0x8000, 0x0000, // 7
    0x7000, 0x8800, 0x8800, 0x7000, 0x8800, 0x8800, 0x7000, 0x0000, // 8
    0x7000, 0x8800, 0x8800, 0x7800, 0x0800, 0x1000, 0xE000, 0x0000, // 9
    0x0000, 0x0000, 0x2000, 0x0000, 0x2000, 0x0000, 0x0000, 0x0000, // :
    0x0000, 0x0000, 0x2000, 0x0000, 0x2000, 0x2000, 0x4000, 0x0000, // ;
    0x0800, 0x1000, 0x2000, 0x4000, 0x2000, 0x1000, 0x0800, 0x0000, // <
    0x0000, 0x0000, 0xF800, 0x0000, 0xF800, 0x0000, 0x0000, 0x0000, // =
    0x4000, 0x2000, 0x1000, 0x0800, 0x1000, 0x2000, 0x4000, 0x0000, // >
    0x7000, 0x8800, 0x0800, 0x3000, 0x2000, 0x0000, 0x2000, 0x0000, // ?
    0x7000, 0x8800, 0xA800, 0xB800, 0xB000, 0x8000, 0x7800, 0x0000, // @
    0x2000, 0x5000, 0x8800, 0x8800, 0xF800, 0x8800, 0x8800, 0x0000, // A
    0xF000, 0x8800, 0x8800, 0xF000, 0x8800, 0x8800, 0xF000, 0x0000, // B
    0x7000, 0x8800, 0x8000, 0x8000, 0x8000, 0x8800, 0x7000, 0x0000, // C
    0xF000, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0xF000, 0x0000, // D
    0xF800, 0x8000, 0x8000, 0xF000, 0x8000, 0x8000, 0xF800, 0x0000, // E
    0xF800, 0x8000, 0x8000, 0xF000, 0x8000, 0x8000, 0x8000, 0x0000, // F
    0x7800, 0x8800, 0x8000, 0x8000, 0x9800, 0x8800, 0x7800, 0x0000, // G
    0x8800, 0x8800, 0x8800, 0xF800, 0x8800, 0x8800, 0x8800, 0x0000, // H
    0x7000, 0x2000, 0x2000, 0x2000, 0x2000, 0x2000, 0x7000, 0x0000, // I
    0x3800, 0x1000, 0x1000, 0x1000, 0x1000, 0x9000, 0x6000, 0x0000, // J
    0x8800, 0x9000, 0xA000, 0xC000, 0xA000, 0x9000, 0x8800, 0x0000, // K
    0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0xF800, 0x0000, // L
    0x8800, 0xD800, 0xA800, 0xA800, 0xA800, 0x8800, 0x8800, 0x0000, // M
    0x8800, 0x8800, 0xC800, 0xA800, 0x9800, 0x8800, 0x8800, 0x0000, // N
    0x7000, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // O
    0xF000, 0x8800, 0x8800, 0xF000, 0x8000, 0x8000, 0x8000, 0x0000, // P
    0x7000, 0x8800, 0x8800, 0x8800, 0xA800, 0x9000, 0x6800, 0x0000, // Q
    0xF000, 0x8800, 0x8800, 0xF000, 0xA000, 0x9000, 0x8800, 0x0000, // R
    0x7000, 0x8800, 0x8000, 0x7000, 0x0800, 0x8800, 0x7000, 0x0000, // S
    0xF800, 0xA800, 0x2000, 0x2000, 0x2000, 0x2000, 0x2000, 0x0000, // T
    0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // U
    0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x5000, 0x2000, 0x0000, // V
    0x8800, 0x8800, 0x8800, 0xA800, 0xA800, 0xA800, 0x5000, 0x0000, // W
    0x8800, 0x8800, 0x5000, 0x2000, 0x5000, 0x8800, 0x8800, 0x0000, // X
    0x8800, 0x8800, 0x5000, 0x2000, 0x2000, 0x2000, 0x2000, 0x0000, // Y
    0xF800, 0x0800, 0x1000, 0x7000, 0x4000, 0x8000, 0xF800, 0x0000, // Z
    0x7800, 0x4000, 0x4000, 0x4000, 0x4000, 0x4000, 0x7800, 0x0000, // [
    0x0000, 0x8000, 0x4000, 0x2000, 0x1000, 0x0800, 0x0000, 0x0000, // backslash
    0x7800, 0x0800, 0x0800, 0x0800, 0x0800, 0x0800, 0x7800, 0x0000, // ]
    0x2000, 0x5000, 0x8800, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // ^
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0xF800, 0x0000, // _
    0x6000, 0x6000, 0x2000, 0x1000, 0x0000, 0x0000, 0x0000, 0x0000, // `
    0x0000, 0x0000, 0x6000, 0x1000, 0x7000, 0x9000, 0x7800, 0x0000, // a
    0x8000, 0x8000, 0xB000, 0xC800, 0x8800, 0xC800, 0xB000, 0x0000, // b
    0x0000, 0x0000, 0x7000, 0x8800, 0x8000, 0x8800, 0x7000, 0x0000, // c
    0x0800, 0x0800, 0x6800, 0x9800, 0x8800, 0x9800, 0x6800, 0x0000, // d
    0x0000, 0x0000, 0x7000, 0x8800, 0xF800, 0x8000, 0x7000, 0x0000, // e
    0x1000, 0x2800, 0x2000, 0x7000, 0x2000, 0x2000, 0x2000, 0x0000, // f
    0x0000, 0x0000, 0x7000, 0x9800, 0x9800, 0x6800, 0x0800, 0x7000, // g
    0x8000, 0x8000, 0xB000, 0xC800, 0x8800, 0x8800, 0x8800, 0x0000, // h
    0x2000, 0x0000, 0x6000, 0x2000, 0x2000, 0x2000, 0x7000, 0x0000, // i
    0x1000, 0x0000, 0x1000, 0x1000, 0x1000, 0x9000, 0x6000, 0x0000, // j
    0x8000, 0x8000, 0x9000, 0xA000, 0xC000, 0xA000, 0x9000, 0x0000, // k
    0x6000, 0x2000, 0x2000, 0x2000, 0x2000, 0x2000, 0x7000, 0x0000, // l
    0x0000, 0x0000, 0xD000, 0xA800, 0xA800, 0xA800, 0xA800, 0x0000, // m
    0x0000, 0x0000, 0xB000, 0xC800, 0x8800, 0x8800, 0x8800, 0x0000, // n
    0x0000, 0x0000, 0x7000, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // o
    0x0000, 0x0000, 0xB000, 0xC800, 0xC800, 0xB000, 0x8000, 0x8000, // p
    0x0000, 0x0000, 0x6800, 0x9800, 0x9800, 0x6800, 0x0800, 0x0800, // q
    0x0000, 0x0000, 0xB000, 0xC800, 0x8000, 0x8000, 0x8000, 0x0000, // r
    0x0000, 0x0000, 0x7800, 0x8000, 0x7000, 0x0800, 0xF000, 0x0000, // s
    0x2000, 0x2000, 0xF800, 0x2000, 0x2000, 0x2800, 0x1000, 0x0000, // t
    0x0000, 0x0000, 0x8800, 0x8800, 0x8800, 0x9800, 0x6800, 0x0000, // u
    0x0000, 0x0000, 0x8800, 0x8800, 0x8800, 0x5000, 0x2000, 0x0000, // v
    0x0000, 0x0000, 0x8800, 0x8800, 0xA800, 0xA800, 0x5000, 0x0000, // w
    0x0000, 0x0000, 0x8800, 0x5000, 0x2000, 0x5000, 0x8800, 0x0000, // x
    0x0000, 0x0000, 0x8800, 0x8800, 0x7800, 0x0800, 0x8800, 0x7000, // y
    0x0000, 0x0000, 0xF800, 0x1000, 0x2000, 0x4000, 0xF800, 0x0000, // z
    0x1000, 0x2000, 0x2000, 0x4000, 0x2000, 0x2000, 0x1000, 0x0000, // {
    0x2000, 0x2000, 0x2000, 0x0000, 0x2000, 0x2000, 0x2000, 0x0000, // |
    0x4000, 0x2000, 0x2000, 0x1000, 0x2000, 0x2000, 0x4000, 0x0000, // }
    0x4000, 0xA800, 0x1000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // ~
];

#[rustfmt::skip]
static FONT_8H_DATA: [u16; 95 * 8] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // space
    0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0x0000, 0x8000, 0x0000, // !
    0xA000, 0xA000, 0xA000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // "
    0x5000, 0x5000, 0xF800, 0x5000, 0xF800, 0x5000, 0x5000, 0x0000, // #
    0x2000, 0x7800, 0xA000, 0x7000, 0x2800, 0xF000, 0x2000, 0x0000, // $
    0xC000, 0xC800, 0x1000, 0x2000, 0x4000, 0x9800, 0x1800, 0x0000, // %
    0x4000, 0xA000, 0xA000, 0x4000, 0xA800, 0x9000, 0x6800, 0x0000, // &
    0x6000, 0x6000, 0x4000, 0x8000, 0x0000, 0x0000, 0x0000, 0x0000, // quote
    0x2000, 0x4000, 0x8000, 0x8000, 0x8000, 0x4000, 0x2000, 0x0000, // (
    0x8000, 0x4000, 0x2000, 0x2000, 0x2000, 0x4000, 0x8000, 0x0000, // )
    0x2000, 0xA800, 0x7000, 0xF800, 0x7000, 0xA800, 0x2000, 0x0000, // *
    0x0000, 0x2000, 0x2000, 0xF800, 0x2000, 0x2000, 0x0000, 0x0000, // +
    0x0000, 0x0000, 0x0000, 0x0000, 0x6000, 0x6000, 0x4000, 0x8000, // ,
    0x0000, 0x0000, 0x0000, 0xF800, 0x0000, 0x0000, 0x0000, 0x0000, // -
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0xC000, 0xC000, 0x0000, // .
    0x0000, 0x0800, 0x1000, 0x2000, 0x4000, 0x8000, 0x0000, 0x0000, // /
    0x7000, 0x8800, 0x9800, 0xA800, 0xC800, 0x8800, 0x7000, 0x0000, // 0
    0x4000, 0xC000, 0x4000, 0x4000, 0x4000, 0x4000, 0xE000, 0x0000, // 1
    0x7000, 0x8800, 0x0800, 0x7000, 0x8000, 0x8000, 0xF800, 0x0000, // 2
    0xF800, 0x0800, 0x1000, 0x3000, 0x0800, 0x8800, 0x7000, 0x0000, // 3
    0x1000, 0x3000, 0x5000, 0x9000, 0xF800, 0x1000, 0x1000, 0x0000, // 4
    0xF800, 0x8000, 0xF000, 0x0800, 0x0800, 0x8800, 0x7000, 0x0000, // 5
    0x3800, 0x4000, 0x8000, 0xF000, 0x8800, 0x8800, 0x7000, 0x0000, // 6
    0xF800, 0x0800, 0x0800, 0x1000, 0x2000, 0x4000, 0x8000, 0x0000, // 7
    0x7000, 0x8800, 0x8800, 0x7000, 0x8800, 0x8800, 0x7000, 0x0000, // 8
    0x7000, 0x8800, 0x8800, 0x7800, 0x0800, 0x1000, 0xE000, 0x0000, // 9
    0x0000, 0x0000, 0x8000, 0x0000, 0x8000, 0x0000, 0x0000, 0x0000, // :
    0x0000, 0x0000, 0x4000, 0x0000, 0x4000, 0x4000, 0x8000, 0x0000, // ;
    0x1000, 0x2000, 0x4000, 0x8000, 0x4000, 0x2000, 0x1000, 0x0000, // <
    0x0000, 0x0000, 0xF800, 0x0000, 0xF800, 0x0000, 0x0000, 0x0000, // =
    0x8000, 0x4000, 0x2000, 0x1000, 0x2000, 0x4000, 0x8000, 0x0000, // >
    0x7000, 0x8800, 0x0800, 0x3000, 0x2000, 0x0000, 0x2000, 0x0000, // ?
    0x7000, 0x8800, 0xA800, 0xB800, 0xB000, 0x8000, 0x7800, 0x0000, // @
    0x2000, 0x5000, 0x8800, 0x8800, 0xF800, 0x8800, 0x8800, 0x0000, // A
    0xF000, 0x8800, 0x8800, 0xF000, 0x8800, 0x8800, 0xF000, 0x0000, // B
    0x7000, 0x8800, 0x8000, 0x8000, 0x8000, 0x8800, 0x7000, 0x0000, // C
    0xF000, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0xF000, 0x0000, // D
    0xF800, 0x8000, 0x8000, 0xF000, 0x8000, 0x8000, 0xF800, 0x0000, // E
    0xF800, 0x8000, 0x8000, 0xF000, 0x8000, 0x8000, 0x8000, 0x0000, // F
    0x7800, 0x8800, 0x8000, 0x8000, 0x9800, 0x8800, 0x7800, 0x0000, // G
    0x8800, 0x8800, 0x8800, 0xF800, 0x8800, 0x8800, 0x8800, 0x0000, // H
    0xE000, 0x4000, 0x4000, 0x4000, 0x4000, 0x4000, 0xE000, 0x0000, // I
    0x3800, 0x1000, 0x1000, 0x1000, 0x1000, 0x9000, 0x6000, 0x0000, // J
    0x8800, 0x9000, 0xA000, 0xC000, 0xA000, 0x9000, 0x8800, 0x0000, // K
    0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0xF800, 0x0000, // L
    0x8800, 0xD800, 0xA800, 0xA800, 0xA800, 0x8800, 0x8800, 0x0000, // M
    0x8800, 0x8800, 0xC800, 0xA800, 0x9800, 0x8800, 0x8800, 0x0000, // N
    0x7000, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // O
    0xF000, 0x8800, 0x8800, 0xF000, 0x8000, 0x8000, 0x8000, 0x0000, // P
    0x7000, 0x8800, 0x8800, 0x8800, 0xA800, 0x9000, 0x6800, 0x0000, // Q
    0xF000, 0x8800, 0x8800, 0xF000, 0xA000, 0x9000, 0x8800, 0x0000, // R
    0x7000, 0x8800, 0x8000, 0x7000, 0x0800, 0x8800, 0x7000, 0x0000, // S
    0xF800, 0xA800, 0x2000, 0x2000, 0x2000, 0x2000, 0x2000, 0x0000, // T
    0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // U
    0x8800, 0x8800, 0x8800, 0x8800, 0x8800, 0x5000, 0x2000, 0x0000, // V
    0x8800, 0x8800, 0x8800, 0xA800, 0xA800, 0xA800, 0x5000, 0x0000, // W
    0x8800, 0x8800, 0x5000, 0x2000, 0x5000, 0x8800, 0x8800, 0x0000, // X
    0x8800, 0x8800, 0x5000, 0x2000, 0x2000, 0x2000, 0x2000, 0x0000, // Y
    0xF800, 0x0800, 0x1000, 0x7000, 0x4000, 0x8000, 0xF800, 0x0000, // Z
    0xF000, 0x8000, 0x8000, 0x8000, 0x8000, 0x8000, 0xF000, 0x0000, // [
    0x0000, 0x8000, 0x4000, 0x2000, 0x1000, 0x0800, 0x0000, 0x0000, // backslash
    0xF000, 0x1000, 0x1000, 0x1000, 0x1000, 0x1000, 0xF000, 0x0000, // ]
    0x2000, 0x5000, 0x8800, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // ^
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0xF800, 0x0000, // _
    0xC000, 0xC000, 0x4000, 0x2000, 0x0000, 0x0000, 0x0000, 0x0000, // `
    0x0000, 0x0000, 0x6000, 0x1000, 0x7000, 0x9000, 0x7800, 0x0000, // a
    0x8000, 0x8000, 0xB000, 0xC800, 0x8800, 0xC800, 0xB000, 0x0000, // b
    0x0000, 0x0000, 0x7000, 0x8800, 0x8000, 0x8800, 0x7000, 0x0000, // c
    0x0800, 0x0800, 0x6800, 0x9800, 0x8800, 0x9800, 0x6800, 0x0000, // d
    0x0000, 0x0000, 0x7000, 0x8800, 0xF800, 0x8000, 0x7000, 0x0000, // e
    0x2000, 0x5000, 0x4000, 0xE000, 0x4000, 0x4000, 0x4000, 0x0000, // f
    0x0000, 0x0000, 0x7000, 0x9800, 0x9800, 0x6800, 0x0800, 0x7000, // g
    0x8000, 0x8000, 0xB000, 0xC800, 0x8800, 0x8800, 0x8800, 0x0000, // h
    0x4000, 0x0000, 0xC000, 0x4000, 0x4000, 0x4000, 0xE000, 0x0000, // i
    0x1000, 0x0000, 0x1000, 0x1000, 0x1000, 0x9000, 0x6000, 0x0000, // j
    0x8000, 0x8000, 0x9000, 0xA000, 0xC000, 0xA000, 0x9000, 0x0000, // k
    0xC000, 0x4000, 0x4000, 0x4000, 0x4000, 0x4000, 0xE000, 0x0000, // l
    0x0000, 0x0000, 0xD000, 0xA800, 0xA800, 0xA800, 0xA800, 0x0000, // m
    0x0000, 0x0000, 0xB000, 0xC800, 0x8800, 0x8800, 0x8800, 0x0000, // n
    0x0000, 0x0000, 0x7000, 0x8800, 0x8800, 0x8800, 0x7000, 0x0000, // o
    0x0000, 0x0000, 0xB000, 0xC800, 0xC800, 0xB000, 0x8000, 0x8000, // p
    0x0000, 0x0000, 0x6800, 0x9800, 0x9800, 0x6800, 0x0800, 0x0800, // q
    0x0000, 0x0000, 0xB000, 0xC800, 0x8000, 0x8000, 0x8000, 0x0000, // r
    0x0000, 0x0000, 0x7800, 0x8000, 0x7000, 0x0800, 0xF000, 0x0000, // s
    0x2000, 0x2000, 0xF800, 0x2000, 0x2000, 0x2800, 0x1000, 0x0000, // t
    0x0000, 0x0000, 0x8800, 0x8800, 0x8800, 0x9800, 0x6800, 0x0000, // u
    0x0000, 0x0000, 0x8800, 0x8800, 0x8800, 0x5000, 0x2000, 0x0000, // v
    0x0000, 0x0000, 0x8800, 0x8800, 0xA800, 0xA800, 0x5000, 0x0000, // w
    0x0000, 0x0000, 0x8800, 0x5000, 0x2000, 0x5000, 0x8800, 0x0000, // x
    0x0000, 0x0000, 0x8800, 0x8800, 0x7800, 0x0800, 0x8800, 0x7000, // y
    0x0000, 0x0000, 0xF800, 0x1000, 0x2000, 0x4000, 0xF800, 0x0000, // z
    0x2000, 0x4000, 0x4000, 0x8000, 0x4000, 0x4000, 0x2000, 0x0000, // {
    0x8000, 0x8000, 0x8000, 0x0000, 0x8000, 0x8000, 0x8000, 0x0000, // |
    0x8000, 0x4000, 0x4000, 0x2000, 0x4000, 0x4000, 0x8000, 0x0000, // }
    0x4000, 0xA800, 0x1000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, // ~
];

#[rustfmt::skip]
static FONT_8H_WIDTHS: [u8; 95] = [
    2, 1, 3, 5, 5, 5, 5, 3, 3, 3, 5, 5, 3, 5, 2, 5,
    5, 3, 5, 5, 5, 5, 5, 5, 5, 5, 1, 2, 4, 5, 4, 5,
    5, 5, 5, 5, 5, 5, 5, 5, 5, 3, 5, 5, 5, 5, 5, 5,
    5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 4, 5, 4, 5, 5,
    3, 5, 5, 5, 5, 5, 4, 5, 5, 3, 4, 4, 3, 5, 5, 5,
    5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 3, 1, 3, 5,
];
