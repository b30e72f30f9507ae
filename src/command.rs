//! The command set shared by the SSD1306 and SH1106.
//!
//! Note 1: Both controllers take their command arguments as further command bytes (D/C low), not
//! as display RAM data, so every `Command` serializes to a short run of command bytes.
//!
//! Note 2: The display RAM is organized in pages of 8 pixel rows. Each data byte written fills one
//! column of a page, least significant bit at the top. The SSD1306 has 128 columns and the SH1106
//! has 132, of which a typical 128 pixel wide module shows columns 2..=129.

use crate::error::Error;
use crate::interface::DisplayInterface;

pub mod consts {
    //! Controller limits.

    /// Number of COM lines (pixel rows) either controller can drive.
    pub const NUM_PIXEL_ROWS: u8 = 64;
    /// Number of pages of display RAM.
    pub const NUM_PAGES: u8 = NUM_PIXEL_ROWS / 8;
    /// Display RAM columns of the SSD1306.
    pub const SSD1306_COLS: u8 = 128;
    /// Display RAM columns of the SH1106.
    pub const SH1106_COLS: u8 = 132;
    pub const PAGE_MAX: u8 = NUM_PAGES - 1;
    pub const ROW_MAX: u8 = NUM_PIXEL_ROWS - 1;
    pub const SSD1306_COL_MAX: u8 = SSD1306_COLS - 1;
    pub const SH1106_COL_MAX: u8 = SH1106_COLS - 1;
}

use self::consts::*;

/// The RAM addressing mode of the SSD1306. The SH1106 only supports page addressing.
///
/// `Display` only ever programs `Horizontal`. The other modes exist because `Command` is public
/// and may be sent directly, e.g. to write a column strip with `Vertical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// After each data byte the column increments; at the end of the column window it wraps to
    /// the start column of the next page in the page window.
    Horizontal,
    /// After each data byte the page increments; at the end of the page window it wraps to the
    /// start page of the next column.
    Vertical,
    /// The column increments within the current page only. Pages are selected explicitly with
    /// `Command::PageStart`.
    Page,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Turn the panel on (`true`) or put it to sleep (`false`).
    DisplayOn(bool),
    /// Set the display clock: low nibble is the divide ratio minus one, high nibble the
    /// oscillator frequency.
    ClockDiv(u8),
    /// Set the multiplex ratio, i.e. the number of active COM lines. Range 16-64.
    Multiplex(u8),
    /// Set the vertical shift of the COM lines. Range 0-63.
    DisplayOffset(u8),
    /// Set the display RAM row shown on the first line. Range 0-63.
    StartLine(u8),
    /// Enable or disable the SSD1306 internal charge pump.
    ChargePump(bool),
    /// Enable or disable the SH1106 internal DC-DC converter.
    DcDc(bool),
    /// Select the SSD1306 RAM addressing mode. See enum for details.
    AddressMode(AddressMode),
    /// Set the SSD1306 column window and reset the column pointer to its start. Range 0-127,
    /// where start must be <= end. Only effective in horizontal or vertical addressing mode.
    ColumnRange(u8, u8),
    /// Set the SSD1306 page window and reset the page pointer to its start. Range 0-7, where
    /// start must be <= end. Only effective in horizontal or vertical addressing mode.
    PageRange(u8, u8),
    /// Set the page pointer in page addressing mode. Range 0-7.
    PageStart(u8),
    /// Set the column pointer in page addressing mode. Range 0-131 (Note 2); the SSD1306 ignores
    /// anything past 127.
    ColumnStart(u8),
    /// Map column address 0 to segment 0 (`false`) or to the last segment (`true`). Flips the
    /// image horizontally.
    SegmentRemap(bool),
    /// Scan COM lines from COM0 up (`false`) or from the last COM line down (`true`). Flips the
    /// image vertically.
    ComScanReversed(bool),
    /// Set the COM pins hardware configuration, as dictated by the panel wiring.
    ComPins(u8),
    /// Set the contrast (segment drive current). Range 0-255.
    Contrast(u8),
    /// Set the pre-charge period: low nibble phase 1, high nibble phase 2, in DCLKs.
    Precharge(u8),
    /// Set the VCOMH deselect level.
    VcomDeselect(u8),
    /// Light every pixel regardless of the RAM content (`true`) or follow RAM (`false`).
    AllOn(bool),
    /// Show RAM bits inverted (`true`) or as-is (`false`).
    Invert(bool),
}

macro_rules! ok_command {
    ($buf:ident, [$arg0:expr]) => {{
        $buf[0] = $arg0;
        Ok(&$buf[..1])
    }};
    ($buf:ident, [$arg0:expr, $arg1:expr]) => {{
        $buf[0] = $arg0;
        $buf[1] = $arg1;
        Ok(&$buf[..2])
    }};
    ($buf:ident, [$arg0:expr, $arg1:expr, $arg2:expr]) => {{
        $buf[0] = $arg0;
        $buf[1] = $arg1;
        $buf[2] = $arg2;
        Ok(&$buf[..3])
    }};
}

impl Command {
    pub fn send<DI>(self, iface: &mut DI) -> Result<(), Error<DI::Error>>
    where
        DI: DisplayInterface,
    {
        let mut buf = [0u8; 3];
        let bytes: Result<&[u8], Error<DI::Error>> = match self {
            Command::DisplayOn(on) => ok_command!(buf, [0xAE | on as u8]),
            Command::ClockDiv(div) => ok_command!(buf, [0xD5, div]),
            Command::Multiplex(lines) => match lines {
                16..=NUM_PIXEL_ROWS => ok_command!(buf, [0xA8, lines - 1]),
                _ => Err(Error::InvalidArgument),
            },
            Command::DisplayOffset(offset) => match offset {
                0..=ROW_MAX => ok_command!(buf, [0xD3, offset]),
                _ => Err(Error::InvalidArgument),
            },
            Command::StartLine(line) => match line {
                0..=ROW_MAX => ok_command!(buf, [0x40 | line]),
                _ => Err(Error::InvalidArgument),
            },
            Command::ChargePump(on) => ok_command!(buf, [0x8D, if on { 0x14 } else { 0x10 }]),
            Command::DcDc(on) => ok_command!(buf, [0xAD, 0x8A | on as u8]),
            Command::AddressMode(mode) => {
                let m = match mode {
                    AddressMode::Horizontal => 0x00,
                    AddressMode::Vertical => 0x01,
                    AddressMode::Page => 0x02,
                };
                ok_command!(buf, [0x20, m])
            }
            Command::ColumnRange(start, end) => match (start, end) {
                (0..=SSD1306_COL_MAX, 0..=SSD1306_COL_MAX) if start <= end => {
                    ok_command!(buf, [0x21, start, end])
                }
                _ => Err(Error::InvalidArgument),
            },
            Command::PageRange(start, end) => match (start, end) {
                (0..=PAGE_MAX, 0..=PAGE_MAX) if start <= end => {
                    ok_command!(buf, [0x22, start, end])
                }
                _ => Err(Error::InvalidArgument),
            },
            Command::PageStart(page) => match page {
                0..=PAGE_MAX => ok_command!(buf, [0xB0 | page]),
                _ => Err(Error::InvalidArgument),
            },
            Command::ColumnStart(col) => match col {
                0..=SH1106_COL_MAX => ok_command!(buf, [col & 0x0F, 0x10 | (col >> 4)]),
                _ => Err(Error::InvalidArgument),
            },
            Command::SegmentRemap(remap) => ok_command!(buf, [0xA0 | remap as u8]),
            Command::ComScanReversed(rev) => ok_command!(buf, [if rev { 0xC8 } else { 0xC0 }]),
            Command::ComPins(cfg) => ok_command!(buf, [0xDA, cfg]),
            Command::Contrast(value) => ok_command!(buf, [0x81, value]),
            Command::Precharge(period) => ok_command!(buf, [0xD9, period]),
            Command::VcomDeselect(level) => ok_command!(buf, [0xDB, level]),
            Command::AllOn(on) => ok_command!(buf, [0xA4 | on as u8]),
            Command::Invert(inv) => ok_command!(buf, [0xA6 | inv as u8]),
        };
        iface.send_commands(bytes?).map_err(Error::Interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Sent, TestSpyInterface};

    fn sent(cmd: Command) -> TestSpyInterface {
        let di = TestSpyInterface::new();
        cmd.send(&mut di.split()).unwrap();
        di
    }

    fn rejected(cmd: Command) {
        let di = TestSpyInterface::new();
        assert_eq!(cmd.send(&mut di.split()), Err(Error::InvalidArgument));
        di.check_multi(sends!());
    }

    #[test]
    fn display_on_off() {
        sent(Command::DisplayOn(true)).check_multi(sends!(0xAF));
        sent(Command::DisplayOn(false)).check_multi(sends!(0xAE));
    }

    #[test]
    fn multiplex() {
        sent(Command::Multiplex(64)).check_multi(sends!(0xA8, 63));
        sent(Command::Multiplex(16)).check_multi(sends!(0xA8, 15));
        rejected(Command::Multiplex(15));
        rejected(Command::Multiplex(65));
    }

    #[test]
    fn display_offset_and_start_line() {
        sent(Command::DisplayOffset(0)).check_multi(sends!(0xD3, 0));
        sent(Command::StartLine(5)).check_multi(sends!(0x45));
        rejected(Command::DisplayOffset(64));
        rejected(Command::StartLine(64));
    }

    #[test]
    fn power_supplies() {
        sent(Command::ChargePump(true)).check_multi(sends!(0x8D, 0x14));
        sent(Command::ChargePump(false)).check_multi(sends!(0x8D, 0x10));
        sent(Command::DcDc(true)).check_multi(sends!(0xAD, 0x8B));
        sent(Command::DcDc(false)).check_multi(sends!(0xAD, 0x8A));
    }

    #[test]
    fn address_mode() {
        sent(Command::AddressMode(AddressMode::Horizontal)).check_multi(sends!(0x20, 0x00));
        sent(Command::AddressMode(AddressMode::Vertical)).check_multi(sends!(0x20, 0x01));
        sent(Command::AddressMode(AddressMode::Page)).check_multi(sends!(0x20, 0x02));
    }

    #[test]
    fn column_range() {
        sent(Command::ColumnRange(0, 127)).check_multi(sends!(0x21, 0, 127));
        sent(Command::ColumnRange(5, 5)).check_multi(sends!(0x21, 5, 5));
        rejected(Command::ColumnRange(0, 128));
        rejected(Command::ColumnRange(10, 9));
    }

    #[test]
    fn page_range() {
        sent(Command::PageRange(0, 7)).check_multi(sends!(0x22, 0, 7));
        rejected(Command::PageRange(0, 8));
        rejected(Command::PageRange(3, 2));
    }

    #[test]
    fn page_and_column_start() {
        sent(Command::PageStart(3)).check_multi(sends!(0xB3));
        rejected(Command::PageStart(8));
        sent(Command::ColumnStart(2)).check_multi(sends!(0x02, 0x10));
        sent(Command::ColumnStart(0x83)).check_multi(sends!(0x03, 0x18));
        rejected(Command::ColumnStart(132));
    }

    #[test]
    fn orientation() {
        sent(Command::SegmentRemap(false)).check_multi(sends!(0xA0));
        sent(Command::SegmentRemap(true)).check_multi(sends!(0xA1));
        sent(Command::ComScanReversed(false)).check_multi(sends!(0xC0));
        sent(Command::ComScanReversed(true)).check_multi(sends!(0xC8));
    }

    #[test]
    fn analog_registers() {
        sent(Command::ClockDiv(0x80)).check_multi(sends!(0xD5, 0x80));
        sent(Command::ComPins(0x12)).check_multi(sends!(0xDA, 0x12));
        sent(Command::Contrast(0xFF)).check_multi(sends!(0x81, 0xFF));
        sent(Command::Precharge(0xF1)).check_multi(sends!(0xD9, 0xF1));
        sent(Command::VcomDeselect(0x40)).check_multi(sends!(0xDB, 0x40));
    }

    #[test]
    fn display_modes() {
        sent(Command::AllOn(false)).check_multi(sends!(0xA4));
        sent(Command::AllOn(true)).check_multi(sends!(0xA5));
        sent(Command::Invert(false)).check_multi(sends!(0xA6));
        sent(Command::Invert(true)).check_multi(sends!(0xA7));
    }

    #[test]
    fn interface_failure() {
        let di = TestSpyInterface::new();
        di.fail();
        assert_eq!(
            Command::Contrast(1).send(&mut di.split()),
            Err(Error::Interface(crate::interface::test_spy::SpyError))
        );
    }
}
