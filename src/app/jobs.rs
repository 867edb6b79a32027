//! Work launched by the scheduler: inline collection plus the three network
//! jobs that run on the task runner.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use super::context::StationContext;
use crate::{
    camera::{self, Camera},
    display::{BLACK, WHITE},
    forecast::{icon_for_token, ForecastSource, Icon},
    net::{ImageUploader, RecordUploader},
    reading::Reading,
    sensing::{CpuThermometer, Sensors, TemperatureEstimator},
    Error, Result,
};

/// Sensor side of the station, owned by the scheduler thread.
pub struct Collector {
    sensors: Box<dyn Sensors>,
    cpu: Box<dyn CpuThermometer>,
    estimator: TemperatureEstimator,
}

impl Collector {
    pub fn new(
        sensors: Box<dyn Sensors>,
        cpu: Box<dyn CpuThermometer>,
        estimator: TemperatureEstimator,
    ) -> Self {
        Self {
            sensors,
            cpu,
            estimator,
        }
    }

    /// Read every sensor and build a corrected, rounded reading.
    pub fn collect(&mut self) -> Result<Reading> {
        let temperature = self
            .estimator
            .estimate(self.sensors.as_mut(), self.cpu.as_mut())?;
        let humidity = self.sensors.read_humidity()?;
        let pressure = self.sensors.read_pressure()?;
        Ok(Reading::from_raw(temperature, humidity, pressure))
    }
}

/// Publish a fresh reading: shared state, log, scrolling text, then the icon.
pub fn publish_reading(ctx: &StationContext, reading: Reading) -> Result<()> {
    let summary = reading.summary();
    ctx.set_reading(reading);
    ctx.logger().info(&summary);
    let mut display = ctx.display();
    display.show_text(&summary, WHITE, BLACK)?;
    display.show_image(ctx.icon())
}

/// Collaborators the network jobs share; cloned into each job thread.
#[derive(Clone)]
pub struct Services {
    pub uploader: Arc<dyn RecordUploader>,
    pub image_uploader: Arc<dyn ImageUploader>,
    pub forecast: Arc<dyn ForecastSource>,
    pub camera: Arc<dyn Camera>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureSettings {
    pub resolution: String,
    pub preserve_old: bool,
    pub archive_dir: PathBuf,
}

/// Refresh the forecast icon. A malformed forecast falls back to the default
/// icon; transport failures keep the current one and surface as errors.
pub fn update_icon(ctx: &StationContext, forecast: &dyn ForecastSource) -> Result<()> {
    let icon = match forecast.fetch_icon_token() {
        Ok(token) => {
            let icon = icon_for_token(&token);
            ctx.logger()
                .info(format!("forecast icon '{token}' -> {icon}"));
            icon
        }
        Err(Error::Parse(msg)) => {
            ctx.logger()
                .warn(format!("malformed forecast ({msg}); showing {}", Icon::default()));
            Icon::default()
        }
        Err(err) => return Err(err),
    };
    ctx.set_icon(icon);
    ctx.display().show_image(icon)
}

pub fn upload_data(ctx: &StationContext, uploader: &dyn RecordUploader) -> Result<()> {
    let Some(reading) = ctx.latest_reading() else {
        ctx.logger().warn("no reading collected yet; skipping data upload");
        return Ok(());
    };
    uploader.upload(&reading)?;
    ctx.logger().info("data uploaded successfully");
    Ok(())
}

/// Capture a picture, optionally archive a timestamped copy, then upload it.
pub fn upload_picture(
    ctx: &StationContext,
    camera: &dyn Camera,
    uploader: &dyn ImageUploader,
    settings: &PictureSettings,
) -> Result<()> {
    let path = camera.capture(&settings.resolution)?;
    ctx.logger().debug(format!("picture captured to {}", path.display()));
    if settings.preserve_old {
        match camera::archive_picture(&path, &settings.archive_dir, SystemTime::now()) {
            Ok(copy) => ctx.logger().debug(format!("picture archived as {}", copy.display())),
            Err(err) => ctx.logger().warn(format!("could not archive picture: {err}")),
        }
    }
    uploader.upload(&path)?;
    ctx.logger().info("picture uploaded successfully");
    Ok(())
}
