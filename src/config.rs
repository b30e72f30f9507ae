//! Panel geometry and the register values sent at init time.

use crate::command::consts::*;
use crate::command::Command;
use crate::error::Error;
use crate::interface;

/// The controller family driving the panel. The two differ in RAM width, power supply command
/// and available addressing modes, which changes how the framebuffer is streamed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Controller {
    /// 128 RAM columns, internal charge pump, horizontal addressing for whole-frame writes.
    Ssd1306,
    /// 132 RAM columns, internal DC-DC converter, page addressing only.
    Sh1106,
}

impl Controller {
    /// Number of display RAM columns.
    pub fn ram_columns(self) -> u8 {
        match self {
            Controller::Ssd1306 => SSD1306_COLS,
            Controller::Sh1106 => SH1106_COLS,
        }
    }
}

/// The portion of the configuration which stays inside the `Display` after init, because
/// drawing and streaming depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub controller: Controller,
    /// Visible pixel columns.
    pub width: u8,
    /// Visible pixel rows, a multiple of 8.
    pub height: u8,
    /// Display RAM column shown as pixel column 0.
    pub column_offset: u8,
}

impl Geometry {
    /// Number of 8-row pages.
    pub fn pages(&self) -> u8 {
        self.height / 8
    }

    /// Size of the framebuffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.width as usize * self.pages() as usize
    }

    /// Last visible RAM column.
    pub fn last_column(&self) -> u8 {
        self.column_offset + self.width - 1
    }

    /// Whether the controller can display this geometry.
    pub fn is_supported(&self) -> bool {
        self.width > 0
            && self.height >= 16
            && self.height <= NUM_PIXEL_ROWS
            && self.height % 8 == 0
            && self.column_offset as u16 + self.width as u16
                <= self.controller.ram_columns() as u16
    }
}

/// A configuration for the display. The constructors pick the register values the common
/// 128x64 modules expect; builder methods override them.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) geometry: Geometry,
    pub(crate) mirror_horizontal: bool,
    pub(crate) mirror_vertical: bool,
    pub(crate) inverted: bool,
    pub(crate) transfer_pow: u8,
    clock_div_cmd: Command,
    com_pins_cmd: Command,
    contrast_cmd: Command,
    precharge_cmd: Command,
    vcom_deselect_cmd: Command,
}

impl Config {
    fn new(geometry: Geometry, contrast: u8, precharge: u8) -> Self {
        Config {
            geometry,
            mirror_horizontal: false,
            mirror_vertical: false,
            inverted: false,
            transfer_pow: 6,
            clock_div_cmd: Command::ClockDiv(0x80),
            com_pins_cmd: Command::ComPins(0x12),
            contrast_cmd: Command::Contrast(contrast),
            precharge_cmd: Command::Precharge(precharge),
            vcom_deselect_cmd: Command::VcomDeselect(0x40),
        }
    }

    /// A 128x64 SSD1306 module with no column offset.
    pub fn ssd1306() -> Self {
        Self::new(
            Geometry {
                controller: Controller::Ssd1306,
                width: 128,
                height: 64,
                column_offset: 0,
            },
            0x7F,
            0xF1,
        )
    }

    /// A 128x64 SH1106 module showing RAM columns 2..=129.
    pub fn sh1106() -> Self {
        Self::new(
            Geometry {
                controller: Controller::Sh1106,
                width: 128,
                height: 64,
                column_offset: 2,
            },
            0xFF,
            0x1F,
        )
    }

    /// Extend this `Config` with the visible panel size. `height` must be a multiple of 8 in
    /// 16..=64, and the width plus column offset must fit the controller RAM.
    pub fn size(self, width: u8, height: u8) -> Self {
        Self {
            geometry: Geometry {
                width,
                height,
                ..self.geometry
            },
            ..self
        }
    }

    /// Extend this `Config` with the RAM column shown as pixel column 0.
    pub fn column_offset(self, offset: u8) -> Self {
        Self {
            geometry: Geometry {
                column_offset: offset,
                ..self.geometry
            },
            ..self
        }
    }

    /// Extend this `Config` to flip the image horizontally. See `Command::SegmentRemap`.
    pub fn mirror_horizontal(self, mirror: bool) -> Self {
        Self {
            mirror_horizontal: mirror,
            ..self
        }
    }

    /// Extend this `Config` to flip the image vertically. See `Command::ComScanReversed`.
    pub fn mirror_vertical(self, mirror: bool) -> Self {
        Self {
            mirror_vertical: mirror,
            ..self
        }
    }

    /// Extend this `Config` to start with inverted pixels. See `Command::Invert`.
    pub fn inverted(self, inverted: bool) -> Self {
        Self { inverted, ..self }
    }

    /// Extend this `Config` with the incremental update granularity: each `Display::tick`
    /// sends `1 << pow` bytes. Clamped when the display is built.
    pub fn transfer_pow(self, pow: u8) -> Self {
        Self {
            transfer_pow: pow,
            ..self
        }
    }

    /// Extend this `Config` with the initial contrast. See `Command::Contrast`.
    pub fn contrast(self, contrast: u8) -> Self {
        Self {
            contrast_cmd: Command::Contrast(contrast),
            ..self
        }
    }

    /// Extend this `Config` with the display clock register. See `Command::ClockDiv`.
    pub fn clock_div(self, div: u8) -> Self {
        Self {
            clock_div_cmd: Command::ClockDiv(div),
            ..self
        }
    }

    /// Extend this `Config` with the COM pins configuration. See `Command::ComPins`.
    pub fn com_pins(self, cfg: u8) -> Self {
        Self {
            com_pins_cmd: Command::ComPins(cfg),
            ..self
        }
    }

    /// Extend this `Config` with the pre-charge period. See `Command::Precharge`.
    pub fn precharge(self, period: u8) -> Self {
        Self {
            precharge_cmd: Command::Precharge(period),
            ..self
        }
    }

    /// Extend this `Config` with the VCOMH deselect level. See `Command::VcomDeselect`.
    pub fn vcom_deselect(self, level: u8) -> Self {
        Self {
            vcom_deselect_cmd: Command::VcomDeselect(level),
            ..self
        }
    }

    /// The geometry this configuration describes.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Transmit the display clock command.
    pub(crate) fn send_clock<DI>(&self, iface: &mut DI) -> Result<(), Error<DI::Error>>
    where
        DI: interface::DisplayInterface,
    {
        self.clock_div_cmd.send(iface)
    }

    /// Transmit the commands for the panel-specific analog settings.
    pub(crate) fn send_analog<DI>(&self, iface: &mut DI) -> Result<(), Error<DI::Error>>
    where
        DI: interface::DisplayInterface,
    {
        self.com_pins_cmd.send(iface)?;
        self.contrast_cmd.send(iface)?;
        self.precharge_cmd.send(iface)?;
        self.vcom_deselect_cmd.send(iface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Sent, TestSpyInterface};

    #[test]
    fn defaults() {
        let g = Config::ssd1306().geometry();
        assert_eq!(g.controller, Controller::Ssd1306);
        assert_eq!((g.width, g.height, g.column_offset), (128, 64, 0));
        assert_eq!(g.buffer_size(), 1024);
        assert_eq!(g.pages(), 8);
        assert_eq!(g.last_column(), 127);

        let g = Config::sh1106().geometry();
        assert_eq!((g.width, g.height, g.column_offset), (128, 64, 2));
        assert_eq!(g.last_column(), 129);
    }

    #[test]
    fn builder_overrides() {
        let cfg = Config::ssd1306()
            .size(128, 32)
            .column_offset(0)
            .mirror_horizontal(true)
            .inverted(true)
            .transfer_pow(3);
        assert_eq!(cfg.geometry().buffer_size(), 512);
        assert!(cfg.mirror_horizontal);
        assert!(!cfg.mirror_vertical);
        assert!(cfg.inverted);
        assert_eq!(cfg.transfer_pow, 3);
    }

    #[test]
    fn supported_geometry() {
        assert!(Config::ssd1306().geometry().is_supported());
        assert!(Config::sh1106().geometry().is_supported());
        assert!(Config::sh1106().size(132, 64).column_offset(0).geometry().is_supported());
        assert!(!Config::ssd1306().column_offset(2).geometry().is_supported());
        assert!(!Config::ssd1306().size(128, 60).geometry().is_supported());
        assert!(!Config::ssd1306().size(128, 8).geometry().is_supported());
        assert!(!Config::ssd1306().size(128, 72).geometry().is_supported());
        assert!(!Config::ssd1306().size(0, 64).geometry().is_supported());
    }

    #[test]
    fn analog_commands() {
        let di = TestSpyInterface::new();
        let cfg = Config::sh1106().contrast(0x10).vcom_deselect(0x35);
        cfg.send_clock(&mut di.split()).unwrap();
        cfg.send_analog(&mut di.split()).unwrap();
        #[cfg_attr(rustfmt, rustfmt_skip)]
        di.check_multi(sends!(
            0xD5, 0x80, // clock
            0xDA, 0x12, // com pins
            0x81, 0x10, // contrast
            0xD9, 0x1F, // precharge
            0xDB, 0x35 // vcom deselect
        ));
    }
}
