//! Environmental sensing: raw sensor access, CPU temperature, and the
//! self-heating correction applied before readings are published.

use crate::Result;

pub mod cpu;
pub mod estimator;
pub mod hts221;
pub mod lps25h;
pub mod sense_hat;
pub mod smoothing;

pub use cpu::SystemThermometer;
pub use estimator::{TemperatureEstimator, DEFAULT_CPU_HEAT_FACTOR};
pub use sense_hat::SenseHat;
pub use smoothing::SmoothingWindow;

/// Environmental sensor board. Temperatures in °C, humidity in %, pressure in millibar.
pub trait Sensors: Send {
    fn read_humidity_temp(&mut self) -> Result<f64>;
    fn read_pressure_temp(&mut self) -> Result<f64>;
    fn read_humidity(&mut self) -> Result<f64>;
    fn read_pressure(&mut self) -> Result<f64>;
}

/// Source of the SoC die temperature in °C.
pub trait CpuThermometer: Send {
    fn read_cpu_temp(&mut self) -> Result<f64>;
}
