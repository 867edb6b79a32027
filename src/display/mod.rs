//! Status output: the Sense HAT LED matrix, or a log-only stand-in when headless.

use crate::{forecast::Icon, Result};

pub mod console;
pub mod font;
pub mod icons;
pub mod matrix;

pub use console::ConsoleDisplay;
pub use matrix::LedMatrix;

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const BLUE: Rgb = [0, 0, 255];
pub const RED: Rgb = [255, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const YELLOW: Rgb = [255, 255, 0];

pub const ROTATIONS: [u16; 4] = [0, 90, 180, 270];

pub trait Display: Send {
    /// Scroll `msg` across the display; returns once the text has passed.
    fn show_text(&mut self, msg: &str, fg: Rgb, bg: Rgb) -> Result<()>;
    fn show_image(&mut self, icon: Icon) -> Result<()>;
    fn set_rotation(&mut self, degrees: u16) -> Result<()>;
    fn rotation(&self) -> u16;
    fn clear(&mut self) -> Result<()>;
}

/// Next rotation step used by the joystick: +90 degrees, wrapping at 360.
pub fn next_rotation(current: u16) -> u16 {
    (current + 90) % 360
}
