//! LPS25H barometric pressure/temperature sensor on the Sense HAT.

use embedded_hal::i2c::{Error as _, I2c};

use crate::{Error, Result};

pub const ADDRESS: u8 = 0x5c;
const WHO_AM_I: u8 = 0x0f;
const DEVICE_ID: u8 = 0xbd;
const CTRL_REG1: u8 = 0x20;
// Power on, 1 Hz, block data update.
const CTRL_REG1_ACTIVE: u8 = 0x94;
const PRESS_OUT_XL: u8 = 0x28;
const TEMP_OUT_L: u8 = 0x2b;

#[derive(Debug, Clone, Default)]
pub struct Lps25h;

impl Lps25h {
    pub fn init<I: I2c>(bus: &mut I) -> Result<Self> {
        let id = read_u8(bus, WHO_AM_I)?;
        if id != DEVICE_ID {
            return Err(Error::Hardware(format!(
                "LPS25H not found at 0x{ADDRESS:02x} (who_am_i=0x{id:02x})"
            )));
        }
        write_u8(bus, CTRL_REG1, CTRL_REG1_ACTIVE)?;
        Ok(Self)
    }

    /// Pressure in millibar (hPa).
    pub fn read_pressure<I: I2c>(&self, bus: &mut I) -> Result<f64> {
        let xl = read_u8(bus, PRESS_OUT_XL)?;
        let l = read_u8(bus, PRESS_OUT_XL + 1)?;
        let h = read_u8(bus, PRESS_OUT_XL + 2)?;
        // 24-bit two's complement, sign-extended through the top byte.
        let raw = i32::from_le_bytes([xl, l, h, if h & 0x80 != 0 { 0xff } else { 0x00 }]);
        Ok(f64::from(raw) / 4096.0)
    }

    pub fn read_temperature<I: I2c>(&self, bus: &mut I) -> Result<f64> {
        let low = read_u8(bus, TEMP_OUT_L)?;
        let high = read_u8(bus, TEMP_OUT_L + 1)?;
        let raw = i16::from_le_bytes([low, high]);
        Ok(42.5 + f64::from(raw) / 480.0)
    }
}

fn read_u8<I: I2c>(bus: &mut I, reg: u8) -> Result<u8> {
    let mut buf = [0u8; 1];
    bus.write_read(ADDRESS, &[reg], &mut buf)
        .map_err(|e| Error::Hardware(format!("LPS25H read 0x{reg:02x}: {:?}", e.kind())))?;
    Ok(buf[0])
}

fn write_u8<I: I2c>(bus: &mut I, reg: u8, value: u8) -> Result<()> {
    bus.write(ADDRESS, &[reg, value])
        .map_err(|e| Error::Hardware(format!("LPS25H write 0x{reg:02x}: {:?}", e.kind())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeI2c;

    fn ready_bus() -> FakeI2c {
        let mut bus = FakeI2c::default();
        bus.set(ADDRESS, WHO_AM_I, DEVICE_ID);
        bus
    }

    #[test]
    fn converts_pressure_counts_to_millibar() {
        let mut bus = ready_bus();
        let sensor = Lps25h::init(&mut bus).unwrap();
        // 1013.25 hPa * 4096 = 4_150_272 = 0x3f5400
        bus.set(ADDRESS, PRESS_OUT_XL, 0x00);
        bus.set(ADDRESS, PRESS_OUT_XL + 1, 0x54);
        bus.set(ADDRESS, PRESS_OUT_XL + 2, 0x3f);
        assert!((sensor.read_pressure(&mut bus).unwrap() - 1013.25).abs() < 1e-9);
        assert_eq!(bus.get(ADDRESS, CTRL_REG1), Some(CTRL_REG1_ACTIVE));
    }

    #[test]
    fn converts_temperature_with_offset() {
        let mut bus = ready_bus();
        let sensor = Lps25h::init(&mut bus).unwrap();
        bus.set_i16(ADDRESS, TEMP_OUT_L, -4800);
        assert!((sensor.read_temperature(&mut bus).unwrap() - 32.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_device_id() {
        let mut bus = FakeI2c::default();
        bus.set(ADDRESS, WHO_AM_I, DEVICE_ID ^ 0x01);
        assert!(Lps25h::init(&mut bus).is_err());
    }
}
