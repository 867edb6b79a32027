use super::{Rgb, BLACK, BLUE, WHITE, YELLOW};
use crate::forecast::Icon;

pub type Frame = [[Rgb; 8]; 8];

const GREY: Rgb = [110, 110, 110];

const SUN: [&str; 8] = [
    "Y..Y..Y.", ".Y.Y.Y..", "..YYY...", "YYYYYYY.", "..YYY...", ".Y.Y.Y..", "Y..Y..Y.", "........",
];
const MOON: [&str; 8] = [
    "..WWW...", ".WW.....", "WW......", "WW......", "WW......", ".WW.....", "..WWW...", "........",
];
const CLOUDY_SUN: [&str; 8] = [
    "....Y.Y.", ".....YY.", "...YYYYY", "..GGGYY.", ".GGGGG..", "GGGGGGG.", "GGGGGGG.", "........",
];
const CLOUDY_NIGHT: [&str; 8] = [
    "....WW..", ".....W..", "....WW..", "..GGG...", ".GGGGG..", "GGGGGGG.", "GGGGGGG.", "........",
];
const RAIN: [&str; 8] = [
    "..GGG...", ".GGGGG..", "GGGGGGG.", "........", "B..B..B.", ".B..B..B", "B..B..B.", "........",
];
const SNOW: [&str; 8] = [
    "W..W..W.", ".W.W.W..", "..WWW...", "WWWWWWW.", "..WWW...", ".W.W.W..", "W..W..W.", "........",
];
const SLEET: [&str; 8] = [
    "..GGG...", ".GGGGG..", "GGGGGGG.", "........", "W..B..W.", ".B..W..B", "W..B..W.", "........",
];
const FOG: [&str; 8] = [
    "........", "GGGGGG..", "........", "..GGGGGG", "........", "GGGGGG..", "........", "..GGGGGG",
];

fn pattern(icon: Icon) -> &'static [&'static str; 8] {
    match icon {
        Icon::Sun => &SUN,
        Icon::Moon => &MOON,
        Icon::CloudySun => &CLOUDY_SUN,
        Icon::CloudyNight => &CLOUDY_NIGHT,
        Icon::Rain => &RAIN,
        Icon::Snow => &SNOW,
        Icon::Sleet => &SLEET,
        Icon::Fog => &FOG,
    }
}

fn colour(code: char) -> Rgb {
    match code {
        'Y' => YELLOW,
        'W' => WHITE,
        'B' => BLUE,
        'G' => GREY,
        _ => BLACK,
    }
}

/// Expand an icon's pattern into an 8x8 frame, indexed `[row][col]`.
pub fn frame(icon: Icon) -> Frame {
    let mut out = [[BLACK; 8]; 8];
    for (y, row) in pattern(icon).iter().enumerate() {
        for (x, code) in row.chars().take(8).enumerate() {
            out[y][x] = colour(code);
        }
    }
    out
}
