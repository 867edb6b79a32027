use embedded_hal::i2c::I2c;

use super::{hts221::Hts221, lps25h::Lps25h, Sensors};
use crate::Result;

/// Sense HAT environmental board: HTS221 and LPS25H sharing one I2C bus.
pub struct SenseHat<I> {
    bus: I,
    humidity: Hts221,
    pressure: Lps25h,
}

impl<I: I2c> SenseHat<I> {
    pub fn new(mut bus: I) -> Result<Self> {
        let humidity = Hts221::init(&mut bus)?;
        let pressure = Lps25h::init(&mut bus)?;
        Ok(Self {
            bus,
            humidity,
            pressure,
        })
    }

    pub fn into_inner(self) -> I {
        self.bus
    }
}

#[cfg(target_os = "linux")]
impl SenseHat<rppal::i2c::I2c> {
    /// Open the Pi's primary I2C bus (/dev/i2c-1).
    pub fn open_default() -> Result<Self> {
        let bus = rppal::i2c::I2c::new()
            .map_err(|e| crate::Error::Io(std::io::Error::other(e.to_string())))?;
        Self::new(bus)
    }
}

impl<I: I2c + Send> Sensors for SenseHat<I> {
    fn read_humidity_temp(&mut self) -> Result<f64> {
        self.humidity.read_temperature(&mut self.bus)
    }

    fn read_pressure_temp(&mut self) -> Result<f64> {
        self.pressure.read_temperature(&mut self.bus)
    }

    fn read_humidity(&mut self) -> Result<f64> {
        self.humidity.read_humidity(&mut self.bus)
    }

    fn read_pressure(&mut self) -> Result<f64> {
        self.pressure.read_pressure(&mut self.bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeI2c;
    use crate::sensing::{hts221, lps25h};

    #[test]
    fn requires_both_sensors() {
        let mut bus = FakeI2c::default();
        bus.set(hts221::ADDRESS, 0x0f, 0xbc);
        bus.set_i16(hts221::ADDRESS, 0x3c, 0);
        bus.set_i16(hts221::ADDRESS, 0x3e, 100);
        bus.set_i16(hts221::ADDRESS, 0x3a, 100);
        let err = SenseHat::new(bus).err().expect("pressure sensor missing");
        assert!(format!("{err}").contains("LPS25H"));
    }

    #[test]
    fn reads_through_shared_bus() {
        let mut bus = FakeI2c::default();
        bus.set(hts221::ADDRESS, 0x0f, 0xbc);
        bus.set(hts221::ADDRESS, 0x33, 80);
        bus.set_i16(hts221::ADDRESS, 0x3c, 0);
        bus.set_i16(hts221::ADDRESS, 0x3e, 100);
        bus.set_i16(hts221::ADDRESS, 0x3a, 100);
        bus.set_i16(hts221::ADDRESS, 0x2a, 50);
        bus.set(lps25h::ADDRESS, 0x0f, 0xbd);
        let mut hat = SenseHat::new(bus).unwrap();
        // T0 = 0 C, T1 = 10 C, raw 50 of 100 -> 5 C
        assert!((hat.read_humidity_temp().unwrap() - 5.0).abs() < 1e-9);
        assert!((hat.read_pressure_temp().unwrap() - 42.5).abs() < 1e-9);
        assert_eq!(hat.read_pressure().unwrap(), 0.0);
    }
}
