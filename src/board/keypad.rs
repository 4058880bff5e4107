//! Adafruit NeoTrellis (seesaw) keypad and per-key NeoPixels.
//!
//! Seesaw register access is `[module base, function]` followed by data;
//! reads need a short settle delay between the select write and the read.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use defmt::{info, warn};
use trellis_duel::config::{KEY_COUNT, SEESAW_ADDRESS, SEESAW_READ_DELAY_US};
use trellis_duel::ui::input_logic::trellis_to_seesaw;
use trellis_duel::ui::Keypad;
use trellis_duel::{Error, LedColor};

// Status module
const STATUS_BASE: u8 = 0x00;
const STATUS_SWRST: u8 = 0x7F;

// NeoPixel module
const NEOPIXEL_BASE: u8 = 0x0E;
const NEOPIXEL_PIN: u8 = 0x01;
const NEOPIXEL_SPEED: u8 = 0x02;
const NEOPIXEL_BUF_LENGTH: u8 = 0x03;
const NEOPIXEL_BUF: u8 = 0x04;
const NEOPIXEL_SHOW: u8 = 0x05;

/// Seesaw pin driving the key NeoPixels on the NeoTrellis.
const NEOTRELLIS_NEOPIX_PIN: u8 = 3;

// Keypad module
const KEYPAD_BASE: u8 = 0x10;
const KEYPAD_EVENT: u8 = 0x01;
const KEYPAD_COUNT: u8 = 0x04;
const KEYPAD_FIFO: u8 = 0x10;

const EDGE_FALLING: u8 = 2;
const EDGE_RISING: u8 = 3;

pub struct NeoTrellis<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> NeoTrellis<I2C, D> {
    /// Reset the seesaw, size the pixel buffer and enable press/release
    /// events on every key. Failures are logged; the pad is still returned.
    pub fn new(i2c: I2C, delay: D) -> Self {
        let mut pad = Self { i2c, delay };
        match pad.begin() {
            Ok(()) => info!("NeoTrellis: ready"),
            Err(e) => warn!("NeoTrellis: init failed: {}", e),
        }
        pad
    }

    fn begin(&mut self) -> Result<(), Error> {
        self.write(&[STATUS_BASE, STATUS_SWRST, 0xFF])?;
        self.delay.delay_ms(10);

        self.write(&[NEOPIXEL_BASE, NEOPIXEL_PIN, NEOTRELLIS_NEOPIX_PIN])?;
        self.write(&[NEOPIXEL_BASE, NEOPIXEL_SPEED, 1])?;
        let buf_len = (KEY_COUNT as u16 * 3).to_be_bytes();
        self.write(&[NEOPIXEL_BASE, NEOPIXEL_BUF_LENGTH, buf_len[0], buf_len[1]])?;

        for key in 0..KEY_COUNT {
            let seesaw_key = trellis_to_seesaw(key);
            for edge in [EDGE_RISING, EDGE_FALLING] {
                // STATE bit 0 = enable, ACTIVE bits 1..4 = edge mask
                let state = 0x01 | ((1 << edge) << 1);
                self.write(&[KEYPAD_BASE, KEYPAD_EVENT, seesaw_key, state])?;
            }
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.i2c.write(SEESAW_ADDRESS, bytes).map_err(|_| Error::Keypad)
    }

    fn read(&mut self, base: u8, function: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.write(&[base, function])?;
        self.delay.delay_us(SEESAW_READ_DELAY_US);
        self.i2c.read(SEESAW_ADDRESS, buf).map_err(|_| Error::Keypad)
    }
}

impl<I2C: I2c, D: DelayNs> Keypad for NeoTrellis<I2C, D> {
    fn poll_count(&mut self) -> Result<u8, Error> {
        let mut count = [0u8; 1];
        self.read(KEYPAD_BASE, KEYPAD_COUNT, &mut count)?;
        Ok(count[0])
    }

    fn read_events(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if buf.is_empty() {
            return Ok(());
        }
        self.read(KEYPAD_BASE, KEYPAD_FIFO, buf)
    }

    fn set_led(&mut self, key: u8, color: LedColor) -> Result<(), Error> {
        if key >= KEY_COUNT {
            return Err(Error::Keypad);
        }
        let offset = (key as u16 * 3).to_be_bytes();
        // NeoTrellis pixels are GRB
        self.write(&[
            NEOPIXEL_BASE,
            NEOPIXEL_BUF,
            offset[0],
            offset[1],
            color.g,
            color.r,
            color.b,
        ])
    }

    fn flush_led_update(&mut self) -> Result<(), Error> {
        self.write(&[NEOPIXEL_BASE, NEOPIXEL_SHOW])
    }
}
