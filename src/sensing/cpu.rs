use std::process::Command;

use sysinfo::Components;

use super::CpuThermometer;
use crate::{Error, Result};

const COMPONENT_HINTS: [&str; 3] = ["cpu", "soc", "thermal"];

/// Reads the SoC temperature from the kernel thermal components, falling back
/// to `vcgencmd measure_temp` on Raspberry Pi firmware.
pub struct SystemThermometer {
    components: Components,
}

impl Default for SystemThermometer {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemThermometer {
    pub fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
        }
    }

    fn from_components(&mut self) -> Option<f64> {
        self.components.refresh(false);
        self.components
            .list()
            .iter()
            .filter(|c| {
                let label = c.label().to_ascii_lowercase();
                COMPONENT_HINTS.iter().any(|hint| label.contains(hint))
            })
            .find_map(|c| c.temperature())
            .map(f64::from)
    }
}

impl CpuThermometer for SystemThermometer {
    fn read_cpu_temp(&mut self) -> Result<f64> {
        if let Some(temp) = self.from_components() {
            return Ok(temp);
        }
        let output = Command::new("vcgencmd")
            .arg("measure_temp")
            .output()
            .map_err(|e| Error::Hardware(format!("cpu temperature unavailable: {e}")))?;
        if !output.status.success() {
            return Err(Error::Hardware(format!(
                "vcgencmd exited with {}",
                output.status
            )));
        }
        parse_vcgencmd(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `temp=48.3'C` as printed by `vcgencmd measure_temp`.
pub fn parse_vcgencmd(raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .strip_prefix("temp=")
        .map(|rest| rest.trim_end_matches("'C"))
        .ok_or_else(|| Error::Parse(format!("unexpected vcgencmd output '{}'", raw.trim())))?;
    value
        .parse()
        .map_err(|_| Error::Parse(format!("invalid cpu temperature '{value}'")))
}
