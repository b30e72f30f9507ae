//! Driver library for SSD1306 and SH1106 monochrome OLED display controllers.
//!
//! Drawing happens in a paged in-memory framebuffer. The framebuffer is pushed to the panel
//! either in one blocking flush or in bounded chunks from a cooperative main loop, see
//! `Display::tick`.

#![cfg_attr(not(feature = "std"), no_std)]

// Macros must be declared before the modules that use them.
#[macro_use]
mod fmt;

#[cfg(test)]
#[macro_use]
mod testing {
    macro_rules! send {
        ([$($d:tt),*]) => {Sent::Data(vec![$($d,)*])};
        ($c:tt) => {Sent::Cmd($c)};
    }
    macro_rules! sends {
        ($($e:tt),*) => {&[$(send!($e),)*]};
    }
}

pub mod command;
pub mod config;
pub mod display;
mod draw;
pub mod error;
pub mod font;
pub mod fonts;
pub mod framebuffer;
pub mod interface;

// Re-exports for primary API.
pub use config::{Config, Controller};
pub use display::{Display, PowerState};
pub use error::Error;
pub use font::Font;
pub use framebuffer::{Color, FrameBuffer};
pub use interface::i2c::I2cInterface;
pub use interface::spi::SpiInterface;
pub use interface::DisplayInterface;
