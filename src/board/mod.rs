//! Board support: nRF52840 wiring, peripheral drivers and Embassy tasks.
//!
//! ## Components
//!
//! - **Display**: SSD1306 64x48 MicroOLED ([`display::OledScreen`])
//! - **Keypad**: NeoTrellis seesaw with per-key NeoPixels ([`keypad::NeoTrellis`])
//! - **Light**: VEML6030 ambient light sensor ([`light_sensor::Veml6030`])
//! - **Reset**: round-reset push button
//!
//! All three I²C devices share TWIM0 through a blocking mutex.

pub mod display;
pub mod keypad;
pub mod light_sensor;
pub mod reset_button;
pub mod tasks;

use core::cell::RefCell;

use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_nrf::buffered_uarte::BufferedUarte;
use embassy_nrf::peripherals::{TIMER0, TWISPI0, UARTE0};
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;

pub type I2cBus = Mutex<NoopRawMutex, RefCell<Twim<'static, TWISPI0>>>;
pub type SharedI2c = I2cDevice<'static, NoopRawMutex, Twim<'static, TWISPI0>>;

/// UART byte pipe to the Wi-Fi bridge (transparent TCP to the broker).
pub type WifiUart = BufferedUarte<'static, UARTE0, TIMER0>;

pub type Screen = display::OledScreen<SharedI2c>;
pub type Trellis = keypad::NeoTrellis<SharedI2c, Delay>;
pub type LightSensor = light_sensor::Veml6030<SharedI2c>;
