use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use super::Logger;
use crate::{display::Display, forecast::Icon, reading::Reading};

/// State shared by the scheduler, the connectivity monitor, the joystick
/// listener and every background job.
pub struct StationContext {
    logger: Arc<Logger>,
    display: Mutex<Box<dyn Display>>,
    reading: Mutex<Option<Reading>>,
    icon: Mutex<Icon>,
    connected: AtomicBool,
}

impl StationContext {
    pub fn new(logger: Arc<Logger>, display: Box<dyn Display>) -> Arc<Self> {
        Arc::new(Self {
            logger,
            display: Mutex::new(display),
            reading: Mutex::new(None),
            icon: Mutex::new(Icon::default()),
            connected: AtomicBool::new(false),
        })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn shared_logger(&self) -> Arc<Logger> {
        self.logger.clone()
    }

    /// Exclusive access to the display. Scrolling text holds the lock for the
    /// whole scroll, so joystick rotations queue behind it.
    pub fn display(&self) -> MutexGuard<'_, Box<dyn Display>> {
        relock(&self.display)
    }

    pub fn latest_reading(&self) -> Option<Reading> {
        relock(&self.reading).clone()
    }

    pub fn set_reading(&self, reading: Reading) {
        *relock(&self.reading) = Some(reading);
    }

    pub fn icon(&self) -> Icon {
        *relock(&self.icon)
    }

    pub fn set_icon(&self, icon: Icon) {
        *relock(&self.icon) = icon;
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the previous value so callers can log transitions only.
    pub fn set_connected(&self, connected: bool) -> bool {
        self.connected.swap(connected, Ordering::SeqCst)
    }
}

// A panicking job must not take the shared state down with it.
fn relock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
