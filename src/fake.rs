//! In-memory stand-ins for the hardware and network collaborators, shared by
//! unit tests and the integration tests under `tests/`.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use crossbeam::channel::{self, Receiver, Sender};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::{
    camera::Camera,
    display::{Display, Rgb},
    forecast::{ForecastSource, Icon},
    net::{ImageUploader, RecordUploader},
    reading::Reading,
    sensing::{CpuThermometer, Sensors},
    Error, Result,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Register-map I2C bus. Addresses with no registers set do not acknowledge.
#[derive(Debug, Default)]
pub struct FakeI2c {
    registers: HashMap<(u8, u8), u8>,
    pointer: HashMap<u8, u8>,
}

impl FakeI2c {
    pub fn set(&mut self, address: u8, reg: u8, value: u8) {
        self.registers.insert((address, reg), value);
    }

    /// Store a little-endian i16 across `reg_low` and `reg_low + 1`.
    pub fn set_i16(&mut self, address: u8, reg_low: u8, value: i16) {
        let [lo, hi] = value.to_le_bytes();
        self.set(address, reg_low, lo);
        self.set(address, reg_low.wrapping_add(1), hi);
    }

    pub fn get(&self, address: u8, reg: u8) -> Option<u8> {
        self.registers.get(&(address, reg)).copied()
    }

    fn present(&self, address: u8) -> bool {
        self.registers.keys().any(|(addr, _)| *addr == address)
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for FakeI2c {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> std::result::Result<(), Self::Error> {
        if !self.present(address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => match &bytes[..] {
                    [] => {}
                    [reg] => {
                        self.pointer.insert(address, *reg);
                    }
                    [reg, values @ ..] => {
                        for (offset, value) in values.iter().enumerate() {
                            self.set(address, reg.wrapping_add(offset as u8), *value);
                        }
                        self.pointer.insert(address, *reg);
                    }
                },
                Operation::Read(buf) => {
                    let start = self.pointer.get(&address).copied().unwrap_or(0);
                    for (offset, slot) in buf.iter_mut().enumerate() {
                        *slot = self
                            .get(address, start.wrapping_add(offset as u8))
                            .unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Sensors returning fixed values; `fail_next` makes the next read fail.
#[derive(Debug, Clone)]
pub struct FakeSensors {
    pub humidity_temp: f64,
    pub pressure_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    failure: Option<String>,
}

impl FakeSensors {
    pub fn new(humidity_temp: f64, pressure_temp: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            humidity_temp,
            pressure_temp,
            humidity,
            pressure,
            failure: None,
        }
    }

    pub fn fail_next(&mut self, msg: &str) {
        self.failure = Some(msg.to_string());
    }

    fn read(&mut self, value: f64) -> Result<f64> {
        match self.failure.take() {
            Some(msg) => Err(Error::Hardware(msg)),
            None => Ok(value),
        }
    }
}

impl Sensors for FakeSensors {
    fn read_humidity_temp(&mut self) -> Result<f64> {
        self.read(self.humidity_temp)
    }

    fn read_pressure_temp(&mut self) -> Result<f64> {
        self.read(self.pressure_temp)
    }

    fn read_humidity(&mut self) -> Result<f64> {
        self.read(self.humidity)
    }

    fn read_pressure(&mut self) -> Result<f64> {
        self.read(self.pressure)
    }
}

#[derive(Debug, Clone)]
pub struct FakeThermometer {
    result: std::result::Result<f64, String>,
}

impl FakeThermometer {
    pub fn new(temp: f64) -> Self {
        Self { result: Ok(temp) }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
        }
    }
}

impl CpuThermometer for FakeThermometer {
    fn read_cpu_temp(&mut self) -> Result<f64> {
        self.result.clone().map_err(Error::Hardware)
    }
}

/// Everything a display was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Text { msg: String, fg: Rgb, bg: Rgb },
    Image(Icon),
    Rotation(u16),
    Clear,
}

/// Recording display; clones share the same event log.
#[derive(Debug, Clone, Default)]
pub struct FakeDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        lock(&self.events).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::Text { msg, .. } => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: DisplayEvent) {
        lock(&self.events).push(event);
    }
}

impl Display for FakeDisplay {
    fn show_text(&mut self, msg: &str, fg: Rgb, bg: Rgb) -> Result<()> {
        self.record(DisplayEvent::Text {
            msg: msg.to_string(),
            fg,
            bg,
        });
        Ok(())
    }

    fn show_image(&mut self, icon: Icon) -> Result<()> {
        self.record(DisplayEvent::Image(icon));
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        self.record(DisplayEvent::Rotation(degrees));
        Ok(())
    }

    fn rotation(&self) -> u16 {
        lock(&self.events)
            .iter()
            .rev()
            .find_map(|event| match event {
                DisplayEvent::Rotation(deg) => Some(*deg),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn clear(&mut self) -> Result<()> {
        self.record(DisplayEvent::Clear);
        Ok(())
    }
}

/// Holds calls open until the test releases them, so a task can be observed
/// while still active.
#[derive(Debug, Clone)]
pub struct Gate {
    release: Receiver<()>,
}

impl Gate {
    /// Returns the gate and the handle that opens it; dropping the handle
    /// opens it for good.
    pub fn pair() -> (Self, Sender<()>) {
        let (tx, rx) = channel::unbounded();
        (Self { release: rx }, tx)
    }

    fn wait(&self) {
        let _ = self.release.recv();
    }
}

#[derive(Debug)]
struct UploadLog<T> {
    calls: Vec<T>,
    failure: Option<String>,
}

impl<T> Default for UploadLog<T> {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            failure: None,
        }
    }
}

/// Counting record uploader, optionally gated and optionally failing.
#[derive(Debug, Clone, Default)]
pub struct FakeRecordUploader {
    log: Arc<Mutex<UploadLog<Reading>>>,
    gate: Option<Gate>,
}

impl FakeRecordUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, msg: &str) {
        lock(&self.log).failure = Some(msg.to_string());
    }

    pub fn uploads(&self) -> Vec<Reading> {
        lock(&self.log).calls.clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.log).calls.len()
    }
}

impl RecordUploader for FakeRecordUploader {
    fn upload(&self, reading: &Reading) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        let mut log = lock(&self.log);
        log.calls.push(reading.clone());
        match &log.failure {
            Some(msg) => Err(Error::Rejected(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Counting image uploader, optionally gated and optionally failing.
#[derive(Debug, Clone, Default)]
pub struct FakeImageUploader {
    log: Arc<Mutex<UploadLog<PathBuf>>>,
    gate: Option<Gate>,
}

impl FakeImageUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, msg: &str) {
        lock(&self.log).failure = Some(msg.to_string());
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        lock(&self.log).calls.clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.log).calls.len()
    }
}

impl ImageUploader for FakeImageUploader {
    fn upload(&self, path: &Path) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        let mut log = lock(&self.log);
        log.calls.push(path.to_path_buf());
        match &log.failure {
            Some(msg) => Err(Error::Io(std::io::Error::other(msg.clone()))),
            None => Ok(()),
        }
    }
}

/// Forecast source returning a scripted token or a parse failure.
#[derive(Debug, Clone)]
pub struct FakeForecast {
    token: Arc<Mutex<std::result::Result<String, String>>>,
    fetches: Arc<Mutex<usize>>,
}

impl FakeForecast {
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::new(Mutex::new(Ok(token.to_string()))),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn malformed(msg: &str) -> Self {
        let forecast = Self::new("");
        *lock(&forecast.token) = Err(msg.to_string());
        forecast
    }

    pub fn set_token(&self, token: &str) {
        *lock(&self.token) = Ok(token.to_string());
    }

    pub fn fetches(&self) -> usize {
        *lock(&self.fetches)
    }
}

impl ForecastSource for FakeForecast {
    fn fetch_icon_token(&self) -> Result<String> {
        *lock(&self.fetches) += 1;
        lock(&self.token).clone().map_err(Error::Parse)
    }
}

/// Camera that "captures" by writing a few bytes to a fixed path.
#[derive(Debug, Clone)]
pub struct FakeCamera {
    output: PathBuf,
    captures: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeCamera {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            captures: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("/nonexistent/latest.jpg")
        }
    }

    /// Resolutions requested so far.
    pub fn captures(&self) -> Vec<String> {
        lock(&self.captures).clone()
    }
}

impl Camera for FakeCamera {
    fn capture(&self, resolution: &str) -> Result<PathBuf> {
        lock(&self.captures).push(resolution.to_string());
        if self.fail {
            return Err(Error::Hardware("fswebcam exited with exit status: 1".into()));
        }
        std::fs::write(&self.output, b"\xff\xd8fake jpeg\xff\xd9")?;
        Ok(self.output.clone())
    }
}
