use crate::{
    camera::Fswebcam,
    cli::RunOptions,
    config::Config,
    display::{ConsoleDisplay, Display, LedMatrix, BLUE, YELLOW},
    net::wunderground::{FtpImageUploader, WundergroundForecast, WundergroundUploader},
    sensing::{Sensors, SystemThermometer, TemperatureEstimator},
    Error, Result,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

mod connection;
mod context;
mod input;
mod jobs;
mod lifecycle;
mod logger;
mod scheduler;
mod tasks;
mod triggers;

pub use connection::{spawn_monitor, Probe, TcpProbe};
pub use context::StationContext;
pub use input::{spawn_joystick, EvdevJoystick, Joystick};
pub use jobs::{Collector, PictureSettings, Services};
pub use lifecycle::StopSignal;
pub use logger::{LogLevel, Logger};
pub use scheduler::{Scheduler, SchedulerSettings, TickReport, NO_CONNECTION_MESSAGE};
pub use tasks::{Launch, TaskRunner};
pub use triggers::{TaskIntervals, TaskName, TaskTimestamps};

const PROCESS_NAME: &str = "weather-station";

/// Config for the station: the config file merged with CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub station: Config,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub headless: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_sources(Config::default(), RunOptions::default())
    }
}

impl AppConfig {
    pub fn from_sources(config: Config, opts: RunOptions) -> Self {
        let mut station = config;
        if opts.no_upload {
            station.weather_upload = false;
        }
        if opts.no_webcam {
            station.webcam_enabled = false;
        }
        let log_level = opts
            .log_level
            .as_deref()
            .unwrap_or(station.log_level.as_str())
            .parse()
            .unwrap_or_default();
        let log_file = opts
            .log_file
            .or_else(|| Some(station.log_file.clone()))
            .filter(|path| !path.is_empty());
        Self {
            station,
            log_level,
            log_file,
            headless: opts.headless,
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        let cfg = &self.station;
        SchedulerSettings {
            intervals: TaskIntervals {
                collect: cfg.measurement_interval,
                icon: cfg.icon_update_interval,
                upload_data: cfg.data_upload_interval,
                upload_picture: cfg.picture_upload_interval,
            },
            weather_upload: cfg.weather_upload,
            webcam_enabled: cfg.webcam_enabled,
            picture: PictureSettings {
                resolution: cfg.picture_resolution.clone(),
                preserve_old: cfg.preserve_old_pictures,
                archive_dir: PathBuf::from(&cfg.old_pictures_path),
            },
        }
    }

    /// Production adapters for the network and camera collaborators.
    pub fn services(&self) -> Services {
        let cfg = &self.station;
        Services {
            uploader: Arc::new(WundergroundUploader::new(
                &cfg.station_id,
                &cfg.station_key,
                cfg.network_timeout,
            )),
            image_uploader: Arc::new(FtpImageUploader::new(
                &cfg.ftp_server,
                &cfg.ftp_login,
                &cfg.ftp_password,
                &cfg.ftp_remote_name,
                cfg.network_timeout,
            )),
            forecast: Arc::new(WundergroundForecast::new(
                &cfg.api_key,
                &cfg.station_id,
                cfg.network_timeout,
            )),
            camera: Arc::new(Fswebcam::new(&cfg.picture_path)),
        }
    }
}

pub struct App {
    config: AppConfig,
    logger: Arc<Logger>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut logger = Logger::new(config.log_level, config.log_file.clone());
        if config.station.log_syslog {
            logger = logger.with_syslog(PROCESS_NAME);
        }
        Self {
            config,
            logger: Arc::new(logger),
        }
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let cfg_file = match opts.config_path.as_deref() {
            Some(path) => Config::load_from_path(Path::new(path))?,
            None => Config::load_or_default()?,
        };
        let merged = AppConfig::from_sources(cfg_file, opts);
        Ok(Self::new(merged))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Entry point: bring up the hardware, run the scheduler until ctrl-c,
    /// then shut down with bounded waits.
    pub fn run(&self) -> Result<()> {
        let cfg = &self.config.station;
        self.logger.info(format!(
            "station started ({PROCESS_NAME} {}, {})",
            env!("CARGO_PKG_VERSION"),
            os_info::get()
        ));
        if cfg.weather_upload && cfg.station_id.is_empty() {
            self.logger
                .warn("weather_upload is on but station_id is empty; uploads will be rejected");
        }

        let stop = StopSignal::new();
        lifecycle::install_ctrlc(stop.clone())?;

        let display = self.open_display()?;
        let collector = Collector::new(
            open_sensors()?,
            Box::new(SystemThermometer::new()),
            TemperatureEstimator::new(cfg.cpu_heat_factor)?,
        );
        let ctx = StationContext::new(self.logger.clone(), display);

        {
            let mut display = ctx.display();
            display.set_rotation(cfg.display_rotation)?;
            display.show_text(&cfg.welcome_message, YELLOW, BLUE)?;
        }

        let mut threads: Vec<(&str, JoinHandle<()>)> = Vec::new();
        if !self.config.headless {
            match EvdevJoystick::open_default() {
                Ok(joystick) => threads.push((
                    "joystick",
                    spawn_joystick(joystick, ctx.clone(), stop.clone())?,
                )),
                Err(err) => self
                    .logger
                    .warn(format!("joystick unavailable, rotation is fixed: {err}")),
            }
        }
        let probe = TcpProbe::new(
            &cfg.connectivity_host,
            cfg.connectivity_port,
            cfg.connectivity_timeout,
        );
        threads.push((
            "connectivity",
            spawn_monitor(
                probe,
                ctx.clone(),
                stop.clone(),
                cfg.connectivity_healthy_interval,
            )?,
        ));

        ctx.display().clear()?;

        let mut scheduler = Scheduler::new(
            ctx.clone(),
            collector,
            self.config.services(),
            self.config.scheduler_settings(),
        );
        scheduler.run(&stop);

        self.logger.info("stopping station");
        stop.trigger();
        scheduler.shutdown(cfg.shutdown_grace);
        for (name, handle) in threads {
            if join_with_timeout(handle, cfg.shutdown_grace) {
                self.logger.debug(format!("thread {name} stopped"));
            } else {
                self.logger
                    .warn(format!("thread {name} did not stop in time; abandoning"));
            }
        }
        if let Err(err) = ctx.display().clear() {
            self.logger.warn(format!("could not clear display: {err}"));
        }
        self.logger.info("station stopped");
        Ok(())
    }

    fn open_display(&self) -> Result<Box<dyn Display>> {
        if self.config.headless {
            return Ok(Box::new(ConsoleDisplay::new(self.logger.clone())));
        }
        let matrix = LedMatrix::open_default().map_err(|err| {
            Error::Hardware(format!("LED matrix unavailable ({err}); try --headless"))
        })?;
        Ok(Box::new(matrix))
    }
}

#[cfg(target_os = "linux")]
fn open_sensors() -> Result<Box<dyn Sensors>> {
    Ok(Box::new(crate::sensing::SenseHat::open_default()?))
}

#[cfg(not(target_os = "linux"))]
fn open_sensors() -> Result<Box<dyn Sensors>> {
    Err(Error::Hardware(
        "Sense HAT sensors are only supported on Linux".into(),
    ))
}

/// Join `handle` if it finishes within `grace`; otherwise leave it running.
fn join_with_timeout(handle: JoinHandle<()>, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    handle.join().is_ok()
}

impl FromStr for AppConfig {
    type Err = Error;

    /// Build a config straight from config-file text, with no CLI overrides.
    fn from_str(raw: &str) -> Result<Self> {
        Ok(Self::from_sources(Config::parse(raw)?, RunOptions::default()))
    }
}
