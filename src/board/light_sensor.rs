//! VEML6030 ambient light sensor.

use embedded_hal::i2c::I2c;

use defmt::warn;
use trellis_duel::config::VEML6030_ADDRESS;
use trellis_duel::light::AmbientLight;
use trellis_duel::Error;

const REG_ALS_CONF: u8 = 0x00;
const REG_ALS: u8 = 0x04;

/// ALS_CONF bit 0: shut down.
const ALS_SD: u16 = 0x0001;

pub struct Veml6030<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Veml6030<I2C> {
    /// Cycle the sensor through shutdown and power it on with gain x1,
    /// 100 ms integration.
    pub fn new(i2c: I2C) -> Self {
        let mut sensor = Self { i2c };
        let init = sensor
            .write_conf(ALS_SD)
            .and_then(|()| sensor.write_conf(0x0000));
        if let Err(e) = init {
            warn!("VEML6030: init failed: {}", e);
        }
        sensor
    }

    fn write_conf(&mut self, conf: u16) -> Result<(), Error> {
        let [lo, hi] = conf.to_le_bytes();
        self.i2c
            .write(VEML6030_ADDRESS, &[REG_ALS_CONF, lo, hi])
            .map_err(|_| Error::LightSensor)
    }
}

impl<I2C: I2c> AmbientLight for Veml6030<I2C> {
    fn read_ambient(&mut self) -> Result<u32, Error> {
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(VEML6030_ADDRESS, &[REG_ALS], &mut raw)
            .map_err(|_| Error::LightSensor)?;
        Ok(u16::from_le_bytes(raw) as u32)
    }
}
