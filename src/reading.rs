use std::time::SystemTime;

const MBAR_TO_INHG: f64 = 0.029_530_0;
const INHG_TO_HPA: f64 = 33.863_89;

/// Latest corrected sample. One live instance, overwritten on every collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_inhg: f64,
    pub collected_at: SystemTime,
}

impl Reading {
    /// Build a reading from raw values, applying the rounding used for display and upload.
    pub fn from_raw(temperature_c: f64, humidity_pct: f64, pressure_mbar: f64) -> Self {
        Self {
            temperature_c: round_to(temperature_c, 1),
            humidity_pct: round_to(humidity_pct, 0),
            pressure_inhg: round_to(pressure_mbar * MBAR_TO_INHG, 1),
            collected_at: SystemTime::now(),
        }
    }

    /// Fahrenheit, rounded to the two decimals a 0.1 °C value can produce.
    pub fn temperature_f(&self) -> f64 {
        round_to(self.temperature_c * 1.8 + 32.0, 2)
    }

    pub fn pressure_hpa(&self) -> f64 {
        (self.pressure_inhg * INHG_TO_HPA).round()
    }

    /// One-line summary used by the log and the scrolling display.
    pub fn summary(&self) -> String {
        format!(
            "Temp: {}C, Pressure: {}hPa, Humidity: {}%",
            self.temperature_c,
            self.pressure_hpa(),
            self.humidity_pct
        )
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
