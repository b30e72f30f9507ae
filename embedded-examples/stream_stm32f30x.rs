//! Full example code for driving a 128x64 SSD1306 module over I2C while keeping the main loop
//! responsive. This runs on an STM32F303RE with the module on I2C1 (PB6 SCL, PB7 SDA).
//!
//! Every pass of the main loop redraws the frame in memory and sends 64 bytes of it, so no pass
//! blocks on the bus for more than about 2 ms at 400 kHz.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

extern crate cortex_m;
extern crate stm32f30x;
extern crate stm32f30x_hal as hal;
#[macro_use]
extern crate cortex_m_rt;
extern crate heapless;
extern crate panic_abort;
extern crate paged_oled;

use core::fmt::Write;
use cortex_m::asm;
use cortex_m_rt::ExceptionFrame;
use heapless::String;
use hal::i2c::I2c;
use hal::prelude::*;
use paged_oled as oled;
use paged_oled::fonts::{FONT_6X8, FONT_8H};
use paged_oled::Color;

entry!(main);

exception!(*, default_handler);
exception!(HardFault, hard_fault);

fn hard_fault(_ef: &ExceptionFrame) -> ! {
    asm::bkpt();
    loop {}
}

fn default_handler(_irqn: i16) {
    loop {}
}

fn main() -> ! {
    let dp = stm32f30x::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.acr);

    // I2C1 is Alternate Function 4 for GPIOs PB6,7.
    let mut gpiob = dp.GPIOB.split(&mut rcc.ahb);
    let scl = gpiob.pb6.into_af4(&mut gpiob.moder, &mut gpiob.afrl);
    let sda = gpiob.pb7.into_af4(&mut gpiob.moder, &mut gpiob.afrl);
    let i2c = I2c::i2c1(dp.I2C1, (scl, sda), 400.khz(), clocks, &mut rcc.apb1);

    let mut disp = oled::Display::new(
        oled::I2cInterface::new(i2c),
        oled::Config::ssd1306().transfer_pow(6),
    );

    // A failed init leaves nothing useful to do; stop here so a debugger shows where.
    if disp.init().is_err() {
        loop {
            asm::bkpt();
        }
    }

    let mut frame: u32 = 0;
    loop {
        disp.clear();
        disp.draw_rectangle(0, 0, 128, 64, Color::White);
        disp.write_str_at(4, 4, "paged-oled", &FONT_8H, Color::White);

        let mut line: String<24> = String::new();
        let _ = write!(line, "frame {}", frame);
        let width = disp.string_width(line.as_str(), &FONT_6X8) as i16;
        disp.write_str_at(124 - width, 52, line.as_str(), &FONT_6X8, Color::White);

        // A ball bouncing left and right.
        let phase = (frame % 200) as i16;
        let x = if phase < 100 { phase } else { 200 - phase };
        disp.fill_circle(14 + x, 32, 6, Color::White);
        disp.draw_progress_bar(4, 42, 60, 6, (phase / 2) as u8, Color::White);

        // Transport errors are retried by the next tick.
        if disp.tick().is_ok() && disp.update_cursor() == 0 {
            frame = frame.wrapping_add(1);
        }
    }
}
