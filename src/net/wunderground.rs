use std::{fs::File, io, path::Path, time::Duration};

use suppaftp::{types::FileType, FtpError, FtpStream};
use ureq::Agent;

use super::{io_error, resolve, ImageUploader, RecordUploader};
use crate::{forecast::ForecastSource, reading::Reading, Error, Result};

pub const UPLOAD_ENDPOINT: &str =
    "https://weatherstation.wunderground.com/weatherstation/updateweatherstation.php";
pub const FORECAST_ENDPOINT: &str = "http://api.wunderground.com/api";
pub const FTP_DEFAULT_PORT: u16 = 21;
const UPLOAD_OK_BODY: &str = "success";

/// Blocking agent with one deadline covering connect, redirects and body.
/// Non-2xx statuses come back as responses so callers can report the body.
fn http_agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    Agent::new_with_config(config)
}

/// GET `url` with `query` appended; returns the status code and body text.
fn http_get(agent: &Agent, url: &str, query: &[(&str, String)]) -> Result<(u16, String)> {
    let request = query
        .iter()
        .fold(agent.get(url), |req, (key, value)| req.query(*key, value));
    let mut response = request.call().map_err(|err| http_error(url, err))?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|err| http_error(url, err))?;
    Ok((status, body))
}

/// Map transport failures onto the crate error, keeping timeouts distinct.
fn http_error(context: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Timeout(which) => Error::Timeout(format!("{context}: {which:?} timeout")),
        ureq::Error::Io(io_err) => io_error(context, io_err),
        ureq::Error::HostNotFound => Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{context}: host not found"),
        )),
        ureq::Error::ConnectionFailed => Error::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("{context}: connection failed"),
        )),
        ureq::Error::BadUri(uri) => Error::InvalidArgs(format!("invalid url {uri}")),
        other => Error::Parse(format!("{context}: {other}")),
    }
}

fn ftp_error(context: &str, err: FtpError) -> Error {
    match err {
        FtpError::ConnectionError(io_err) => io_error(context, io_err),
        FtpError::UnexpectedResponse(_) => Error::Rejected(format!("{context}: {err}")),
        other => Error::Parse(format!("{context}: {other}")),
    }
}

/// Personal weather station uploads via the `updateraw` protocol.
#[derive(Clone)]
pub struct WundergroundUploader {
    endpoint: String,
    station_id: String,
    station_key: String,
    agent: Agent,
}

impl WundergroundUploader {
    pub fn new(station_id: &str, station_key: &str, timeout: Duration) -> Self {
        Self {
            endpoint: UPLOAD_ENDPOINT.to_string(),
            station_id: station_id.to_string(),
            station_key: station_key.to_string(),
            agent: http_agent(timeout),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn query(&self, reading: &Reading) -> Vec<(&'static str, String)> {
        vec![
            ("action", "updateraw".into()),
            ("ID", self.station_id.clone()),
            ("PASSWORD", self.station_key.clone()),
            ("dateutc", "now".into()),
            ("tempf", reading.temperature_f().to_string()),
            ("humidity", reading.humidity_pct.to_string()),
            ("baromin", reading.pressure_inhg.to_string()),
        ]
    }
}

impl RecordUploader for WundergroundUploader {
    fn upload(&self, reading: &Reading) -> Result<()> {
        let (status, body) = http_get(&self.agent, &self.endpoint, &self.query(reading))?;
        let body = body.trim();
        if (200..300).contains(&status) && body == UPLOAD_OK_BODY {
            Ok(())
        } else {
            Err(Error::Rejected(format!("HTTP {status}: {body}")))
        }
    }
}

/// Forecast lookup keyed by API key and station id.
#[derive(Clone)]
pub struct WundergroundForecast {
    endpoint: String,
    api_key: String,
    station_id: String,
    agent: Agent,
}

impl WundergroundForecast {
    pub fn new(api_key: &str, station_id: &str, timeout: Duration) -> Self {
        Self {
            endpoint: FORECAST_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            station_id: station_id.to_string(),
            agent: http_agent(timeout),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/forecast/q/pws:{}.json",
            self.endpoint, self.api_key, self.station_id
        )
    }
}

impl ForecastSource for WundergroundForecast {
    fn fetch_icon_token(&self) -> Result<String> {
        let (status, body) = http_get(&self.agent, &self.url(), &[])?;
        if !(200..300).contains(&status) {
            return Err(Error::Rejected(format!("forecast HTTP {status}")));
        }
        crate::forecast::parse_icon_token(&body)
    }
}

/// Webcam uploads over passive-mode FTP to a fixed remote filename.
#[derive(Debug, Clone)]
pub struct FtpImageUploader {
    server: String,
    port: u16,
    login: String,
    password: String,
    remote_name: String,
    timeout: Duration,
}

impl FtpImageUploader {
    pub fn new(
        server: &str,
        login: &str,
        password: &str,
        remote_name: &str,
        timeout: Duration,
    ) -> Self {
        let (server, port) = match server.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host, port),
                Err(_) => (server, FTP_DEFAULT_PORT),
            },
            None => (server, FTP_DEFAULT_PORT),
        };
        Self {
            server: server.to_string(),
            port,
            login: login.to_string(),
            password: password.to_string(),
            remote_name: remote_name.to_string(),
            timeout,
        }
    }

    fn open_session(&self) -> Result<FtpStream> {
        let context = format!("ftp connect {}:{}", self.server, self.port);
        let mut last_err = None;
        for addr in resolve(&self.server, self.port)? {
            match FtpStream::connect_timeout(addr, self.timeout) {
                Ok(session) => {
                    session.get_ref().set_read_timeout(Some(self.timeout))?;
                    session.get_ref().set_write_timeout(Some(self.timeout))?;
                    return Ok(session);
                }
                Err(err) => last_err = Some(ftp_error(&context, err)),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::InvalidArgs(context)))
    }
}

impl ImageUploader for FtpImageUploader {
    fn upload(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)?;
        let mut session = self.open_session()?;
        session
            .login(self.login.as_str(), self.password.as_str())
            .map_err(|err| ftp_error("ftp login", err))?;
        session
            .transfer_type(FileType::Binary)
            .map_err(|err| ftp_error("ftp binary mode", err))?;
        session
            .put_file(self.remote_name.as_str(), &mut file)
            .map_err(|err| ftp_error(&format!("ftp store {}", self.remote_name), err))?;
        session.quit().map_err(|err| ftp_error("ftp quit", err))
    }
}
