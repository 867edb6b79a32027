use super::{CpuThermometer, Sensors, SmoothingWindow};
use crate::{Error, Result};

/// Empirical divisor compensating for heat soaking from the adjacent SoC.
pub const DEFAULT_CPU_HEAT_FACTOR: f64 = 1.5;

/// Corrects the Sense HAT temperature for CPU self-heating and smooths it.
#[derive(Debug, Clone)]
pub struct TemperatureEstimator {
    heat_factor: f64,
    window: SmoothingWindow,
}

impl Default for TemperatureEstimator {
    fn default() -> Self {
        Self {
            heat_factor: DEFAULT_CPU_HEAT_FACTOR,
            window: SmoothingWindow::new(),
        }
    }
}

impl TemperatureEstimator {
    pub fn new(heat_factor: f64) -> Result<Self> {
        if !heat_factor.is_finite() || heat_factor <= 0.0 {
            return Err(Error::InvalidArgs(format!(
                "cpu heat factor must be a positive number, got {heat_factor}"
            )));
        }
        Ok(Self {
            heat_factor,
            window: SmoothingWindow::new(),
        })
    }

    /// Read both sensor temperatures and the CPU temperature, correct, then smooth.
    pub fn estimate<S, C>(&mut self, sensors: &mut S, cpu: &mut C) -> Result<f64>
    where
        S: Sensors + ?Sized,
        C: CpuThermometer + ?Sized,
    {
        let from_humidity = sensors.read_humidity_temp()?;
        let from_pressure = sensors.read_pressure_temp()?;
        let cpu_temp = cpu.read_cpu_temp()?;
        let corrected = self.correct(from_humidity, from_pressure, cpu_temp);
        Ok(self.window.push(corrected))
    }

    pub fn correct(&self, from_humidity: f64, from_pressure: f64, cpu_temp: f64) -> f64 {
        let avg_temp = (from_humidity + from_pressure) / 2.0;
        avg_temp - ((cpu_temp - avg_temp) / self.heat_factor)
    }

    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }
}
