use crate::{camera::parse_resolution, display::ROTATIONS, Error, Result};
use std::path::Path;
use std::time::Duration;

pub mod loader;

pub const DEFAULT_MEASUREMENT_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_ICON_UPDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_DATA_UPLOAD_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_PICTURE_UPLOAD_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_PICTURE_RESOLUTION: &str = "1280x720";
pub const DEFAULT_PICTURE_PATH: &str = "./pictures/latest.jpg";
pub const DEFAULT_OLD_PICTURES_PATH: &str = "./pictures/";
pub const DEFAULT_FTP_SERVER: &str = "webcam.wunderground.com";
pub const DEFAULT_FTP_REMOTE_NAME: &str = "image.jpg";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Weather station";
pub const DEFAULT_DISPLAY_ROTATION: u16 = 180;
pub const DEFAULT_CONNECTIVITY_HOST: &str = "8.8.8.8";
pub const DEFAULT_CONNECTIVITY_PORT: u16 = 53;
pub const DEFAULT_CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECTIVITY_HEALTHY_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "station.log";
const CONFIG_DIR_NAME: &str = ".weather_station";
const CONFIG_FILE_NAME: &str = "config.toml";

/// User-supplied settings loaded from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub station_id: String,
    pub station_key: String,
    pub api_key: String,
    pub weather_upload: bool,
    pub webcam_enabled: bool,
    pub measurement_interval: Duration,
    pub icon_update_interval: Duration,
    pub data_upload_interval: Duration,
    pub picture_upload_interval: Duration,
    pub picture_resolution: String,
    pub picture_path: String,
    pub preserve_old_pictures: bool,
    pub old_pictures_path: String,
    pub ftp_server: String,
    pub ftp_login: String,
    pub ftp_password: String,
    pub ftp_remote_name: String,
    pub welcome_message: String,
    pub display_rotation: u16,
    pub cpu_heat_factor: f64,
    pub connectivity_host: String,
    pub connectivity_port: u16,
    pub connectivity_timeout: Duration,
    pub connectivity_healthy_interval: Duration,
    pub network_timeout: Duration,
    pub shutdown_grace: Duration,
    pub log_level: String,
    pub log_file: String,
    pub log_syslog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_id: String::new(),
            station_key: String::new(),
            api_key: String::new(),
            weather_upload: true,
            webcam_enabled: true,
            measurement_interval: DEFAULT_MEASUREMENT_INTERVAL,
            icon_update_interval: DEFAULT_ICON_UPDATE_INTERVAL,
            data_upload_interval: DEFAULT_DATA_UPLOAD_INTERVAL,
            picture_upload_interval: DEFAULT_PICTURE_UPLOAD_INTERVAL,
            picture_resolution: DEFAULT_PICTURE_RESOLUTION.to_string(),
            picture_path: DEFAULT_PICTURE_PATH.to_string(),
            preserve_old_pictures: true,
            old_pictures_path: DEFAULT_OLD_PICTURES_PATH.to_string(),
            ftp_server: DEFAULT_FTP_SERVER.to_string(),
            ftp_login: String::new(),
            ftp_password: String::new(),
            ftp_remote_name: DEFAULT_FTP_REMOTE_NAME.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            display_rotation: DEFAULT_DISPLAY_ROTATION,
            cpu_heat_factor: crate::sensing::DEFAULT_CPU_HEAT_FACTOR,
            connectivity_host: DEFAULT_CONNECTIVITY_HOST.to_string(),
            connectivity_port: DEFAULT_CONNECTIVITY_PORT,
            connectivity_timeout: DEFAULT_CONNECTIVITY_TIMEOUT,
            connectivity_healthy_interval: DEFAULT_CONNECTIVITY_HEALTHY_INTERVAL,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            log_syslog: false,
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        loader::load_or_default()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        loader::load_from_path(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        loader::save_to_path(self, path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        loader::parse(raw)
    }
}

/// Reject values the station cannot run with.
pub fn validate(cfg: &Config) -> Result<()> {
    let intervals = [
        ("measurement_interval", cfg.measurement_interval),
        ("icon_update_interval", cfg.icon_update_interval),
        ("data_upload_interval", cfg.data_upload_interval),
        ("picture_upload_interval", cfg.picture_upload_interval),
        ("connectivity_timeout", cfg.connectivity_timeout),
        ("network_timeout", cfg.network_timeout),
    ];
    for (name, value) in intervals {
        if value.is_zero() {
            return Err(Error::InvalidArgs(format!("{name} must be greater than zero")));
        }
    }
    if !ROTATIONS.contains(&cfg.display_rotation) {
        return Err(Error::InvalidArgs(format!(
            "display_rotation must be one of 0, 90, 180, 270 (got {})",
            cfg.display_rotation
        )));
    }
    if !(cfg.cpu_heat_factor.is_finite() && cfg.cpu_heat_factor > 0.0) {
        return Err(Error::InvalidArgs(format!(
            "cpu_heat_factor must be a positive number (got {})",
            cfg.cpu_heat_factor
        )));
    }
    if cfg.connectivity_port == 0 {
        return Err(Error::InvalidArgs("connectivity_port must be non-zero".into()));
    }
    if cfg.log_level.parse::<crate::app::LogLevel>().is_err() {
        return Err(Error::InvalidArgs(format!(
            "log_level must be one of error, warn, info, debug, trace (got '{}')",
            cfg.log_level
        )));
    }
    if cfg.webcam_enabled {
        parse_resolution(&cfg.picture_resolution)?;
        if cfg.picture_path.is_empty() {
            return Err(Error::InvalidArgs("picture_path must not be empty".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn rejects_zero_interval() {
        let cfg = Config {
            data_upload_interval: Duration::ZERO,
            ..Config::default()
        };
        let err = validate(&cfg).unwrap_err();
        assert!(format!("{err}").contains("data_upload_interval"));
    }

    #[test]
    fn rejects_odd_rotation_and_heat_factor() {
        let cfg = Config {
            display_rotation: 45,
            ..Config::default()
        };
        assert!(validate(&cfg).is_err());
        let cfg = Config {
            cpu_heat_factor: -1.0,
            ..Config::default()
        };
        assert!(format!("{}", validate(&cfg).unwrap_err()).contains("cpu_heat_factor"));
    }

    #[test]
    fn resolution_only_checked_with_webcam() {
        let cfg = Config {
            picture_resolution: "huge".into(),
            ..Config::default()
        };
        assert!(validate(&cfg).is_err());
        let cfg = Config {
            webcam_enabled: false,
            ..cfg
        };
        validate(&cfg).unwrap();
    }
}
