//! HTS221 humidity/temperature sensor on the Sense HAT.

use embedded_hal::i2c::{Error as _, I2c};

use crate::{Error, Result};

pub const ADDRESS: u8 = 0x5f;
const WHO_AM_I: u8 = 0x0f;
const DEVICE_ID: u8 = 0xbc;
const CTRL_REG1: u8 = 0x20;
// Power on, block data update, 1 Hz.
const CTRL_REG1_ACTIVE: u8 = 0x85;
const HUMIDITY_OUT_L: u8 = 0x28;
const TEMP_OUT_L: u8 = 0x2a;
const H0_RH_X2: u8 = 0x30;
const H1_RH_X2: u8 = 0x31;
const T0_DEGC_X8: u8 = 0x32;
const T1_DEGC_X8: u8 = 0x33;
const T1_T0_MSB: u8 = 0x35;
const H0_T0_OUT_L: u8 = 0x36;
const H1_T0_OUT_L: u8 = 0x3a;
const T0_OUT_L: u8 = 0x3c;
const T1_OUT_L: u8 = 0x3e;

/// Factory calibration points used to linearise the raw outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub h0_rh: f64,
    pub h1_rh: f64,
    pub h0_out: i16,
    pub h1_out: i16,
    pub t0_degc: f64,
    pub t1_degc: f64,
    pub t0_out: i16,
    pub t1_out: i16,
}

impl Calibration {
    pub fn temperature(&self, raw: i16) -> f64 {
        let span = f64::from(self.t1_out) - f64::from(self.t0_out);
        self.t0_degc + (f64::from(raw) - f64::from(self.t0_out)) * (self.t1_degc - self.t0_degc) / span
    }

    pub fn humidity(&self, raw: i16) -> f64 {
        let span = f64::from(self.h1_out) - f64::from(self.h0_out);
        let value =
            self.h0_rh + (f64::from(raw) - f64::from(self.h0_out)) * (self.h1_rh - self.h0_rh) / span;
        value.clamp(0.0, 100.0)
    }

    fn validate(&self) -> Result<()> {
        if self.t0_out == self.t1_out || self.h0_out == self.h1_out {
            return Err(Error::Hardware(
                "HTS221 calibration table is degenerate".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Hts221 {
    calibration: Calibration,
}

impl Hts221 {
    /// Verify the device id, power the sensor up, and load its calibration.
    pub fn init<I: I2c>(bus: &mut I) -> Result<Self> {
        let id = read_u8(bus, WHO_AM_I)?;
        if id != DEVICE_ID {
            return Err(Error::Hardware(format!(
                "HTS221 not found at 0x{ADDRESS:02x} (who_am_i=0x{id:02x})"
            )));
        }
        write_u8(bus, CTRL_REG1, CTRL_REG1_ACTIVE)?;

        let msb = read_u8(bus, T1_T0_MSB)?;
        let t0_x8 = (u16::from(msb & 0x03) << 8) | u16::from(read_u8(bus, T0_DEGC_X8)?);
        let t1_x8 = (u16::from((msb & 0x0c) >> 2) << 8) | u16::from(read_u8(bus, T1_DEGC_X8)?);
        let calibration = Calibration {
            h0_rh: f64::from(read_u8(bus, H0_RH_X2)?) / 2.0,
            h1_rh: f64::from(read_u8(bus, H1_RH_X2)?) / 2.0,
            h0_out: read_i16(bus, H0_T0_OUT_L)?,
            h1_out: read_i16(bus, H1_T0_OUT_L)?,
            t0_degc: f64::from(t0_x8) / 8.0,
            t1_degc: f64::from(t1_x8) / 8.0,
            t0_out: read_i16(bus, T0_OUT_L)?,
            t1_out: read_i16(bus, T1_OUT_L)?,
        };
        calibration.validate()?;
        Ok(Self { calibration })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn read_temperature<I: I2c>(&self, bus: &mut I) -> Result<f64> {
        Ok(self.calibration.temperature(read_i16(bus, TEMP_OUT_L)?))
    }

    pub fn read_humidity<I: I2c>(&self, bus: &mut I) -> Result<f64> {
        Ok(self.calibration.humidity(read_i16(bus, HUMIDITY_OUT_L)?))
    }
}

fn read_u8<I: I2c>(bus: &mut I, reg: u8) -> Result<u8> {
    let mut buf = [0u8; 1];
    bus.write_read(ADDRESS, &[reg], &mut buf)
        .map_err(|e| Error::Hardware(format!("HTS221 read 0x{reg:02x}: {:?}", e.kind())))?;
    Ok(buf[0])
}

fn read_i16<I: I2c>(bus: &mut I, reg_low: u8) -> Result<i16> {
    let low = read_u8(bus, reg_low)?;
    let high = read_u8(bus, reg_low + 1)?;
    Ok(i16::from_le_bytes([low, high]))
}

fn write_u8<I: I2c>(bus: &mut I, reg: u8, value: u8) -> Result<()> {
    bus.write(ADDRESS, &[reg, value])
        .map_err(|e| Error::Hardware(format!("HTS221 write 0x{reg:02x}: {:?}", e.kind())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeI2c;

    fn calibrated_bus() -> FakeI2c {
        let mut bus = FakeI2c::default();
        bus.set(ADDRESS, WHO_AM_I, DEVICE_ID);
        // H0 = 20 %rH, H1 = 80 %rH
        bus.set(ADDRESS, H0_RH_X2, 40);
        bus.set(ADDRESS, H1_RH_X2, 160);
        // T0 = 10 C, T1 = 40 C (x8 = 80 / 320 -> 320 needs the msb bits)
        bus.set(ADDRESS, T0_DEGC_X8, 80);
        bus.set(ADDRESS, T1_DEGC_X8, (320u16 & 0xff) as u8);
        bus.set(ADDRESS, T1_T0_MSB, ((320u16 >> 8) as u8) << 2);
        bus.set_i16(ADDRESS, H0_T0_OUT_L, 0);
        bus.set_i16(ADDRESS, H1_T0_OUT_L, 6000);
        bus.set_i16(ADDRESS, T0_OUT_L, 100);
        bus.set_i16(ADDRESS, T1_OUT_L, 400);
        bus
    }

    #[test]
    fn loads_calibration_and_powers_up() {
        let mut bus = calibrated_bus();
        let sensor = Hts221::init(&mut bus).unwrap();
        let cal = sensor.calibration();
        assert_eq!(cal.t0_degc, 10.0);
        assert_eq!(cal.t1_degc, 40.0);
        assert_eq!(cal.h0_rh, 20.0);
        assert_eq!(cal.h1_rh, 80.0);
        assert_eq!(bus.get(ADDRESS, CTRL_REG1), Some(CTRL_REG1_ACTIVE));
    }

    #[test]
    fn interpolates_temperature_and_humidity() {
        let mut bus = calibrated_bus();
        let sensor = Hts221::init(&mut bus).unwrap();
        bus.set_i16(ADDRESS, TEMP_OUT_L, 250);
        bus.set_i16(ADDRESS, HUMIDITY_OUT_L, 3000);
        assert!((sensor.read_temperature(&mut bus).unwrap() - 25.0).abs() < 1e-9);
        assert!((sensor.read_humidity(&mut bus).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn humidity_is_clamped() {
        let mut bus = calibrated_bus();
        let sensor = Hts221::init(&mut bus).unwrap();
        bus.set_i16(ADDRESS, HUMIDITY_OUT_L, 30_000);
        assert_eq!(sensor.read_humidity(&mut bus).unwrap(), 100.0);
    }

    #[test]
    fn rejects_wrong_device_id() {
        let mut bus = calibrated_bus();
        bus.set(ADDRESS, WHO_AM_I, 0x00);
        let err = Hts221::init(&mut bus).unwrap_err();
        assert!(format!("{err}").contains("HTS221 not found"));
    }

    #[test]
    fn missing_device_is_a_hardware_error() {
        let mut bus = FakeI2c::default();
        let err = Hts221::init(&mut bus).unwrap_err();
        assert!(matches!(err, Error::Hardware(_)));
    }
}
