//! SSD1306 64x48 MicroOLED feedback screens.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use defmt::warn;
use trellis_duel::config::OLED_ADDRESS;
use trellis_duel::control::GameDisplay;
use trellis_duel::Error;

/// Type alias for the concrete display driver.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize64x48, BufferedGraphicsMode<DisplaySize64x48>>;

/// Wait / turn / result screens, one to three short lines each.
pub struct OledScreen<I2C> {
    display: Display<I2C>,
}

impl<I2C> OledScreen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the panel and clear it. A failed init is logged; draws
    /// will then report `Error::Display`.
    pub fn new(i2c: I2C) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, OLED_ADDRESS);
        let mut display = Ssd1306::new(interface, DisplaySize64x48, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        if display.init().is_err() {
            warn!("OLED: init failed");
        }
        display.clear_buffer();
        if display.flush().is_err() {
            warn!("OLED: initial clear failed");
        }
        Self { display }
    }

    fn draw_lines(&mut self, lines: &[&str]) -> Result<(), Error> {
        self.display.clear_buffer();
        for (row, line) in lines.iter().enumerate() {
            let y = 10 + row as i32 * 12;
            Text::new(line, Point::new(0, y), text_style())
                .draw(&mut self.display)
                .map_err(|_| Error::Display)?;
        }
        self.display.flush().map_err(|_| Error::Display)
    }
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

impl<I2C> GameDisplay for OledScreen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn draw_wait(&mut self) -> Result<(), Error> {
        self.draw_lines(&["WAIT", "for the", "other", "player"])
    }

    fn draw_turn_prompt(&mut self) -> Result<(), Error> {
        self.draw_lines(&["YOUR", "TURN!", "watch &", "repeat"])
    }

    fn draw_winner(&mut self) -> Result<(), Error> {
        self.draw_lines(&["", "WINNER!"])
    }

    fn draw_loser(&mut self) -> Result<(), Error> {
        self.draw_lines(&["", "LOSER"])
    }
}
