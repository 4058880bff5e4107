//! trellis-duel firmware for the nRF52840.
//!
//! Brings up the shared I²C bus (OLED, NeoTrellis, VEML6030), the UART to
//! the Wi-Fi bridge and the reset button, then hands each peripheral to
//! its Embassy task.

#![no_std]
#![no_main]

mod board;

use core::cell::RefCell;

use defmt::info;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::gpio::Pin;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals, uarte};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;
use static_cell::StaticCell;
use trellis_duel::config::BOARD_ROLE;
use {defmt_rtt as _, panic_probe as _};

use board::display::OledScreen;
use board::keypad::NeoTrellis;
use board::light_sensor::Veml6030;
use board::{tasks, I2cBus};

bind_interrupts!(struct Irqs {
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

const UART_RX_BUFFER: usize = 512;
const UART_TX_BUFFER: usize = 256;

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();
static UART_RX: StaticCell<[u8; UART_RX_BUFFER]> = StaticCell::new();
static UART_TX: StaticCell<[u8; UART_TX_BUFFER]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("trellis-duel starting as {}", BOARD_ROLE);

    // I²C (TWIM0) shared by the three sensors/actuators
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let twim = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);
    let bus: &'static I2cBus = I2C_BUS.init(Mutex::new(RefCell::new(twim)));

    let screen = OledScreen::new(I2cDevice::new(bus));
    let trellis = NeoTrellis::new(I2cDevice::new(bus), Delay);
    let sensor = Veml6030::new(I2cDevice::new(bus));

    // Wi-Fi bridge UART (transparent TCP to the broker)
    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = BufferedUarte::new(
        p.UARTE0,
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
        p.PPI_GROUP0,
        Irqs,
        p.P0_06,
        p.P0_08,
        uart_config,
        UART_RX.init([0; UART_RX_BUFFER]),
        UART_TX.init([0; UART_TX_BUFFER]),
    );

    spawner.must_spawn(tasks::network_task(uart));
    spawner.must_spawn(tasks::control_task(screen));
    spawner.must_spawn(tasks::ui_task(trellis));
    spawner.must_spawn(tasks::light_task(sensor));
    spawner.must_spawn(board::reset_button::reset_button_task(
        p.P0_11.degrade(),
        &tasks::RESET,
    ));

    info!("All tasks spawned");
}
