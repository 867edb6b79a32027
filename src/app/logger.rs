use std::fs::{File, OpenOptions};
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use syslog::{Facility, Formatter3164, LoggerBackend};

pub const ENV_LOG_LEVEL: &str = "WEATHER_STATION_LOG_LEVEL";
pub const ENV_LOG_PATH: &str = "WEATHER_STATION_LOG_PATH";

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl FromStr for LogLevel {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

type SyslogWriter = syslog::Logger<LoggerBackend, Formatter3164>;

/// Stderr logger with optional append-only file and syslog sinks.
/// Shared between threads behind an `Arc`.
pub struct Logger {
    level: LogLevel,
    file: Option<Mutex<File>>,
    syslog: Option<Mutex<SyslogWriter>>,
}

impl Logger {
    pub fn new(level: LogLevel, file_path: Option<String>) -> Self {
        let env_level = std::env::var(ENV_LOG_LEVEL)
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok());
        let effective_level = env_level.unwrap_or(level);

        let env_file = std::env::var(ENV_LOG_PATH).ok();
        let path = env_file.or(file_path).filter(|p| !p.is_empty());
        let file = path.and_then(|p| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(Mutex::new)
        });
        Self {
            level: effective_level,
            file,
            syslog: None,
        }
    }

    /// Also forward every line to the local syslog daemon (facility `daemon`).
    /// A missing syslog socket is reported on stderr and otherwise ignored.
    pub fn with_syslog(mut self, process: &str) -> Self {
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: process.to_string(),
            pid: std::process::id(),
        };
        match syslog::unix(formatter) {
            Ok(writer) => self.syslog = Some(Mutex::new(writer)),
            Err(err) => eprintln!("syslog unavailable: {err}"),
        }
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, msg: impl AsRef<str>) {
        if level > self.level {
            return;
        }
        let msg = msg.as_ref();
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let line = format!("[{ts:.3}] [{level:?}] {msg}");
        eprintln!("{line}");
        if let Some(file) = self.file.as_ref() {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{line}");
            }
        }
        if let Some(writer) = self.syslog.as_ref() {
            if let Ok(mut writer) = writer.lock() {
                let _ = match level {
                    LogLevel::Error => writer.err(msg),
                    LogLevel::Warn => writer.warning(msg),
                    LogLevel::Info => writer.info(msg),
                    LogLevel::Debug | LogLevel::Trace => writer.debug(msg),
                };
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn trace(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Trace, msg);
    }
}
