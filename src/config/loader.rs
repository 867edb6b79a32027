use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::{Error, Result};

use super::{Config, CONFIG_DIR_NAME, CONFIG_FILE_NAME};

pub fn load_or_default() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        cfg.save_to_path(&path)?;
        super::validate(&cfg)?;
        return Ok(cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        super::validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path)?;
    parse(&raw)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = format!(
        "# weather-station config\n\
station_id = \"{}\"\n\
station_key = \"{}\"\n\
api_key = \"{}\"\n\
weather_upload = {}\n\
webcam_enabled = {}\n\
measurement_interval = \"{}\"\n\
icon_update_interval = \"{}\"\n\
data_upload_interval = \"{}\"\n\
picture_upload_interval = \"{}\"\n\
picture_resolution = \"{}\"\n\
picture_path = \"{}\"\n\
preserve_old_pictures = {}\n\
old_pictures_path = \"{}\"\n\
ftp_server = \"{}\"\n\
ftp_login = \"{}\"\n\
ftp_password = \"{}\"\n\
ftp_remote_name = \"{}\"\n\
welcome_message = \"{}\"\n\
display_rotation = {}\n\
cpu_heat_factor = {}\n\
connectivity_host = \"{}\"\n\
connectivity_port = {}\n\
connectivity_timeout = \"{}\"\n\
connectivity_healthy_interval = \"{}\"\n\
network_timeout = \"{}\"\n\
shutdown_grace = \"{}\"\n\
log_level = \"{}\"\n\
log_file = \"{}\"\n\
log_syslog = {}\n",
        config.station_id,
        config.station_key,
        config.api_key,
        config.weather_upload,
        config.webcam_enabled,
        format_duration(config.measurement_interval),
        format_duration(config.icon_update_interval),
        format_duration(config.data_upload_interval),
        format_duration(config.picture_upload_interval),
        config.picture_resolution,
        config.picture_path,
        config.preserve_old_pictures,
        config.old_pictures_path,
        config.ftp_server,
        config.ftp_login,
        config.ftp_password,
        config.ftp_remote_name,
        config.welcome_message,
        config.display_rotation,
        config.cpu_heat_factor,
        config.connectivity_host,
        config.connectivity_port,
        format_duration(config.connectivity_timeout),
        format_duration(config.connectivity_healthy_interval),
        format_duration(config.network_timeout),
        format_duration(config.shutdown_grace),
        config.log_level,
        config.log_file,
        config.log_syslog,
    );
    fs::write(path, contents)?;
    Ok(())
}

pub fn parse(raw: &str) -> Result<Config> {
    let mut cfg = Config::default();

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            Error::InvalidArgs(format!("invalid config line {}: '{}'", idx + 1, line))
        })?;

        let key = key.trim();
        let value = value.trim().trim_matches('"');
        let line_no = idx + 1;
        match key {
            "station_id" => cfg.station_id = value.to_string(),
            "station_key" => cfg.station_key = value.to_string(),
            "api_key" => cfg.api_key = value.to_string(),
            "weather_upload" => cfg.weather_upload = parse_value(key, value, line_no)?,
            "webcam_enabled" => cfg.webcam_enabled = parse_value(key, value, line_no)?,
            "measurement_interval" => {
                cfg.measurement_interval = parse_duration(key, value, line_no)?
            }
            "icon_update_interval" => {
                cfg.icon_update_interval = parse_duration(key, value, line_no)?
            }
            "data_upload_interval" => {
                cfg.data_upload_interval = parse_duration(key, value, line_no)?
            }
            "picture_upload_interval" => {
                cfg.picture_upload_interval = parse_duration(key, value, line_no)?
            }
            "picture_resolution" => cfg.picture_resolution = value.to_string(),
            "picture_path" => cfg.picture_path = value.to_string(),
            "preserve_old_pictures" => {
                cfg.preserve_old_pictures = parse_value(key, value, line_no)?
            }
            "old_pictures_path" => cfg.old_pictures_path = value.to_string(),
            "ftp_server" => cfg.ftp_server = value.to_string(),
            "ftp_login" => cfg.ftp_login = value.to_string(),
            "ftp_password" => cfg.ftp_password = value.to_string(),
            "ftp_remote_name" => cfg.ftp_remote_name = value.to_string(),
            "welcome_message" => cfg.welcome_message = value.to_string(),
            "display_rotation" => cfg.display_rotation = parse_value(key, value, line_no)?,
            "cpu_heat_factor" => cfg.cpu_heat_factor = parse_value(key, value, line_no)?,
            "connectivity_host" => cfg.connectivity_host = value.to_string(),
            "connectivity_port" => cfg.connectivity_port = parse_value(key, value, line_no)?,
            "connectivity_timeout" => {
                cfg.connectivity_timeout = parse_duration(key, value, line_no)?
            }
            "connectivity_healthy_interval" => {
                cfg.connectivity_healthy_interval = parse_duration(key, value, line_no)?
            }
            "network_timeout" => cfg.network_timeout = parse_duration(key, value, line_no)?,
            "shutdown_grace" => cfg.shutdown_grace = parse_duration(key, value, line_no)?,
            "log_level" => cfg.log_level = value.to_ascii_lowercase(),
            "log_file" => cfg.log_file = value.to_string(),
            "log_syslog" => cfg.log_syslog = parse_value(key, value, line_no)?,
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown config key '{}' on line {}",
                    other, line_no
                )));
            }
        }
    }

    super::validate(&cfg)?;
    Ok(cfg)
}

fn parse_value<T: FromStr>(key: &str, value: &str, line: usize) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidArgs(format!("invalid {key} value on line {line}")))
}

/// Durations are humantime strings ("90s", "5m", "1h 30m").
fn parse_duration(key: &str, value: &str, line: usize) -> Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| Error::InvalidArgs(format!("invalid {key} on line {line}: {e}")))
}

fn format_duration(value: Duration) -> String {
    humantime::format_duration(value).to_string()
}

fn config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidArgs("HOME not set; cannot locate config directory".into()))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_home(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("weather_station_home_{name}_{stamp}"))
    }

    fn temp_path(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("weather_station_test_{name}_{stamp}"))
    }

    #[test]
    fn loads_default_when_missing() {
        let path = temp_path("missing");
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_valid_config() {
        let path = temp_path("parse");
        let contents = r#"
            # station identity
            station_id = "KSTATION1"
            station_key = "s3cr=t"
            weather_upload = false
            measurement_interval = "2m"
            icon_update_interval = "1h"
            picture_resolution = "640x480"
            welcome_message = "Ciao meteo"
            display_rotation = 90
            cpu_heat_factor = 2.0
            connectivity_port = 443
            connectivity_timeout = "3s"
            log_level = "DEBUG"
            log_syslog = true
        "#;
        fs::write(&path, contents).unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.station_id, "KSTATION1");
        assert_eq!(cfg.station_key, "s3cr=t");
        assert!(!cfg.weather_upload);
        assert_eq!(cfg.measurement_interval, Duration::from_secs(120));
        assert_eq!(cfg.icon_update_interval, Duration::from_secs(3600));
        assert_eq!(cfg.picture_resolution, "640x480");
        assert_eq!(cfg.welcome_message, "Ciao meteo");
        assert_eq!(cfg.display_rotation, 90);
        assert_eq!(cfg.cpu_heat_factor, 2.0);
        assert_eq!(cfg.connectivity_port, 443);
        assert_eq!(cfg.connectivity_timeout, Duration::from_secs(3));
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.log_syslog);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unknown_key() {
        let path = temp_path("unknown");
        fs::write(&path, "station_id = \"K\"\nnope = 1").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err}").contains("unknown config key 'nope' on line 2"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_bad_values_with_line_numbers() {
        let err = parse("weather_upload = sometimes").unwrap_err();
        assert!(format!("{err}").contains("invalid weather_upload value on line 1"));
        let err = parse("\nmeasurement_interval = \"soon\"").unwrap_err();
        assert!(format!("{err}").contains("invalid measurement_interval on line 2"));
        let err = parse("just a line").unwrap_err();
        assert!(format!("{err}").contains("invalid config line 1"));
    }

    #[test]
    fn validation_runs_after_parse() {
        let err = parse("display_rotation = 45").unwrap_err();
        assert!(format!("{err}").contains("display_rotation"));
        let err = parse("measurement_interval = \"0s\"").unwrap_err();
        assert!(format!("{err}").contains("greater than zero"));
    }

    #[test]
    fn saves_and_loads_round_trip() {
        let path = temp_path("roundtrip").join("config.toml");
        let cfg = Config {
            station_id: "KSTATION1".into(),
            ftp_password: "pw".into(),
            measurement_interval: Duration::from_secs(90),
            shutdown_grace: Duration::from_millis(1500),
            cpu_heat_factor: 1.25,
            webcam_enabled: false,
            ..Config::default()
        };
        cfg.save_to_path(&path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(cfg, loaded);
        let _ = fs::remove_file(&path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir(parent);
        }
    }

    #[test]
    fn load_or_default_creates_file_with_defaults() {
        let home = temp_home("create");
        std::env::set_var("HOME", &home);
        let cfg_path = home.join(".weather_station").join("config.toml");

        let cfg = load_or_default().unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg_path.exists(), "expected config file to be created");

        let contents = fs::read_to_string(&cfg_path).unwrap();
        assert!(contents.contains("station_id ="));
        assert!(contents.contains("measurement_interval = \"1m\""));

        let _ = fs::remove_dir_all(home);
    }
}
