use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{context::StationContext, lifecycle::StopSignal};
use crate::{display::next_rotation, Error, Result};

pub const JOYSTICK_NAME: &str = "Raspberry Pi Sense HAT Joystick";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// struct input_event: a timeval (two C longs) then type u16, code u16, value i32.
const EVENT_SIZE: usize = 2 * std::mem::size_of::<usize>() + 8;
const EV_KEY: u16 = 0x01;
const KEY_PRESSED: i32 = 1;

/// Source of joystick presses. `poll_press` must not block.
pub trait Joystick: Send {
    fn poll_press(&mut self) -> Result<bool>;
}

/// Reads raw evdev `input_event` records from a non-blocking reader.
pub struct EvdevJoystick<R> {
    reader: R,
    buf: [u8; EVENT_SIZE],
    filled: usize,
}

impl<R: Read + Send> EvdevJoystick<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: [0; EVENT_SIZE],
            filled: 0,
        }
    }
}

#[cfg(target_os = "linux")]
impl EvdevJoystick<fs::File> {
    /// Open the Sense HAT joystick's event device in non-blocking mode.
    pub fn open_default() -> Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;
        const O_NONBLOCK: i32 = 0o4000;

        let device = find_device(Path::new("/sys/class/input"), JOYSTICK_NAME)?;
        let file = fs::OpenOptions::new()
            .read(true)
            .custom_flags(O_NONBLOCK)
            .open(&device)
            .map_err(|e| Error::Hardware(format!("open {}: {e}", device.display())))?;
        Ok(Self::new(file))
    }
}

#[cfg(not(target_os = "linux"))]
impl EvdevJoystick<fs::File> {
    pub fn open_default() -> Result<Self> {
        Err(Error::Hardware(
            "joystick unsupported on this platform".into(),
        ))
    }
}

impl<R: Read + Send> Joystick for EvdevJoystick<R> {
    fn poll_press(&mut self) -> Result<bool> {
        loop {
            match self.reader.read(&mut self.buf[self.filled..]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.filled += n;
                    if self.filled < EVENT_SIZE {
                        continue;
                    }
                    self.filled = 0;
                    let (kind, value) = parse_event(&self.buf);
                    if kind == EV_KEY && value == KEY_PRESSED {
                        return Ok(true);
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }
}

fn parse_event(raw: &[u8; EVENT_SIZE]) -> (u16, i32) {
    let tail = &raw[EVENT_SIZE - 8..];
    let kind = u16::from_ne_bytes([tail[0], tail[1]]);
    let value = i32::from_ne_bytes([tail[4], tail[5], tail[6], tail[7]]);
    (kind, value)
}

/// Find `/dev/input/eventN` for the input device called `name`.
pub fn find_device(sys_input: &Path, name: &str) -> Result<PathBuf> {
    let entries = fs::read_dir(sys_input)
        .map_err(|e| Error::Hardware(format!("scan {}: {e}", sys_input.display())))?;
    for entry in entries.flatten() {
        let node = entry.file_name();
        let node = node.to_string_lossy();
        if !node.starts_with("event") {
            continue;
        }
        let label = fs::read_to_string(entry.path().join("device/name")).unwrap_or_default();
        if label.trim() == name {
            return Ok(Path::new("/dev/input").join(node.as_ref()));
        }
    }
    Err(Error::Hardware(format!("input device '{name}' not found")))
}

/// Rotate the display 90 degrees on every joystick press until `stop` fires.
pub fn spawn_joystick<J>(
    mut joystick: J,
    ctx: Arc<StationContext>,
    stop: Arc<StopSignal>,
) -> Result<JoinHandle<()>>
where
    J: Joystick + 'static,
{
    thread::Builder::new()
        .name("station-joystick".into())
        .spawn(move || {
            while !stop.is_stopped() {
                match joystick.poll_press() {
                    Ok(true) => rotate(&ctx),
                    Ok(false) => {
                        if stop.wait(POLL_INTERVAL) {
                            break;
                        }
                    }
                    Err(err) => {
                        ctx.logger().error(format!("joystick stopped: {err}"));
                        break;
                    }
                }
            }
        })
        .map_err(Error::Io)
}

fn rotate(ctx: &StationContext) {
    let mut display = ctx.display();
    let next = next_rotation(display.rotation());
    match display.set_rotation(next) {
        Ok(()) => ctx.logger().debug(format!("display rotated to {next}")),
        Err(err) => ctx.logger().warn(format!("rotation failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{LogLevel, Logger};
    use crate::display::Display;
    use crate::fake::{DisplayEvent, FakeDisplay};
    use std::io::Cursor;
    use std::time::Instant;

    fn event(kind: u16, code: u16, value: i32) -> Vec<u8> {
        let mut raw = vec![0u8; EVENT_SIZE - 8];
        raw.extend_from_slice(&kind.to_ne_bytes());
        raw.extend_from_slice(&code.to_ne_bytes());
        raw.extend_from_slice(&value.to_ne_bytes());
        raw
    }

    #[test]
    fn only_key_presses_count() {
        let mut stream = Vec::new();
        stream.extend(event(0x00, 0, 0)); // EV_SYN
        stream.extend(event(EV_KEY, 103, 0)); // release
        stream.extend(event(EV_KEY, 28, 1)); // enter pressed
        let mut joystick = EvdevJoystick::new(Cursor::new(stream));
        assert!(joystick.poll_press().unwrap());
        assert!(!joystick.poll_press().unwrap());
    }

    #[test]
    fn finds_device_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for (node, name) in [("event0", "gpio-keys"), ("event3", JOYSTICK_NAME), ("mouse0", JOYSTICK_NAME)] {
            let device = dir.path().join(node).join("device");
            fs::create_dir_all(&device).unwrap();
            fs::write(device.join("name"), format!("{name}\n")).unwrap();
        }
        let found = find_device(dir.path(), JOYSTICK_NAME).unwrap();
        assert_eq!(found, Path::new("/dev/input/event3"));
        assert!(find_device(dir.path(), "missing").is_err());
    }

    #[test]
    fn presses_rotate_the_display() {
        let display = FakeDisplay::new();
        let mut initial = display.clone();
        initial.set_rotation(180).unwrap();
        let ctx = StationContext::new(
            Arc::new(Logger::new(LogLevel::Error, None)),
            Box::new(display.clone()),
        );
        let stop = StopSignal::new();
        let mut stream = event(EV_KEY, 103, 1);
        stream.extend(event(EV_KEY, 103, 1));
        let handle = spawn_joystick(EvdevJoystick::new(Cursor::new(stream)), ctx, stop.clone()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while display.rotation() != 0 {
            assert!(Instant::now() < deadline, "joystick never rotated twice");
            thread::sleep(Duration::from_millis(5));
        }
        stop.trigger();
        handle.join().unwrap();
        assert_eq!(
            display.events(),
            vec![
                DisplayEvent::Rotation(180),
                DisplayEvent::Rotation(270),
                DisplayEvent::Rotation(0)
            ]
        );
    }
}
