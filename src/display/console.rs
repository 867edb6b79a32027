use std::sync::Arc;

use super::{Display, Rgb, ROTATIONS};
use crate::{app::Logger, forecast::Icon, Error, Result};

/// Headless display: everything that would reach the matrix goes to the log instead.
pub struct ConsoleDisplay {
    logger: Arc<Logger>,
    rotation: u16,
}

impl ConsoleDisplay {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            rotation: 0,
        }
    }
}

impl Display for ConsoleDisplay {
    fn show_text(&mut self, msg: &str, _fg: Rgb, _bg: Rgb) -> Result<()> {
        self.logger.info(format!("display: {msg}"));
        Ok(())
    }

    fn show_image(&mut self, icon: Icon) -> Result<()> {
        self.logger.debug(format!("display: icon {}", icon.as_str()));
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if !ROTATIONS.contains(&degrees) {
            return Err(Error::InvalidArgs(format!(
                "rotation must be one of 0, 90, 180, 270 (got {degrees})"
            )));
        }
        self.rotation = degrees;
        Ok(())
    }

    fn rotation(&self) -> u16 {
        self.rotation
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}
