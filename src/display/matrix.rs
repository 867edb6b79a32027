use std::{
    fs::{self, File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use super::{
    font::{self, GLYPH_HEIGHT},
    icons::{self, Frame},
    Display, Rgb, BLACK, ROTATIONS,
};
use crate::{forecast::Icon, Error, Result};

const FB_NAME: &str = "RPi-Sense FB";
const SIZE: usize = 8;
const TEXT_TOP_ROW: usize = 1;
pub const DEFAULT_SCROLL_DELAY: Duration = Duration::from_millis(100);

/// Sense HAT 8x8 LED matrix driven through its RGB565 framebuffer.
pub struct LedMatrix<W> {
    sink: W,
    rotation: u16,
    scroll_delay: Duration,
    last: Frame,
}

impl LedMatrix<File> {
    /// Locate the Sense HAT framebuffer under /sys/class/graphics and open it.
    pub fn open_default() -> Result<Self> {
        let path = find_framebuffer(Path::new("/sys/class/graphics"))?;
        let file = OpenOptions::new().write(true).open(&path)?;
        Ok(Self::new(file, DEFAULT_SCROLL_DELAY))
    }
}

impl<W: Write + Seek + Send> LedMatrix<W> {
    pub fn new(sink: W, scroll_delay: Duration) -> Self {
        Self {
            sink,
            rotation: 0,
            scroll_delay,
            last: [[BLACK; SIZE]; SIZE],
        }
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn render(&mut self, frame: &Frame) -> Result<()> {
        let mut bytes = [0u8; SIZE * SIZE * 2];
        for (y, row) in frame.iter().enumerate() {
            for (x, rgb) in row.iter().enumerate() {
                let (rx, ry) = rotate(x, y, self.rotation);
                let idx = (ry * SIZE + rx) * 2;
                bytes[idx..idx + 2].copy_from_slice(&rgb565(*rgb).to_le_bytes());
            }
        }
        self.sink.seek(SeekFrom::Start(0))?;
        self.sink.write_all(&bytes)?;
        self.sink.flush()?;
        self.last = *frame;
        Ok(())
    }
}

impl<W: Write + Seek + Send> Display for LedMatrix<W> {
    fn show_text(&mut self, msg: &str, fg: Rgb, bg: Rgb) -> Result<()> {
        let blank = [false; GLYPH_HEIGHT];
        let mut columns = vec![blank; SIZE];
        columns.extend(font::render_columns(msg));
        columns.extend(std::iter::repeat(blank).take(SIZE));

        for start in 0..=columns.len() - SIZE {
            let mut frame = [[bg; SIZE]; SIZE];
            for (x, column) in columns[start..start + SIZE].iter().enumerate() {
                for (dy, lit) in column.iter().enumerate() {
                    if *lit {
                        frame[TEXT_TOP_ROW + dy][x] = fg;
                    }
                }
            }
            self.render(&frame)?;
            if !self.scroll_delay.is_zero() {
                thread::sleep(self.scroll_delay);
            }
        }
        Ok(())
    }

    fn show_image(&mut self, icon: Icon) -> Result<()> {
        self.render(&icons::frame(icon))
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if !ROTATIONS.contains(&degrees) {
            return Err(Error::InvalidArgs(format!(
                "rotation must be one of 0, 90, 180, 270 (got {degrees})"
            )));
        }
        self.rotation = degrees;
        let last = self.last;
        self.render(&last)
    }

    fn rotation(&self) -> u16 {
        self.rotation
    }

    fn clear(&mut self) -> Result<()> {
        self.render(&[[BLACK; SIZE]; SIZE])
    }
}

/// Map a logical pixel to its physical position for the given rotation.
pub fn rotate(x: usize, y: usize, rotation: u16) -> (usize, usize) {
    let max = SIZE - 1;
    match rotation {
        90 => (max - y, x),
        180 => (max - x, max - y),
        270 => (y, max - x),
        _ => (x, y),
    }
}

pub fn rgb565([r, g, b]: Rgb) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

/// Find `/dev/fbN` whose sysfs name matches the Sense HAT driver.
pub fn find_framebuffer(sys_graphics: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(sys_graphics)?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("fb") {
            continue;
        }
        let label = fs::read_to_string(entry.path().join("name")).unwrap_or_default();
        if label.trim() == FB_NAME {
            return Ok(PathBuf::from("/dev").join(name.as_ref()));
        }
    }
    Err(Error::Hardware(format!(
        "no '{FB_NAME}' framebuffer under {}",
        sys_graphics.display()
    )))
}
