//! Forecast icon selection from Weather Underground icon tokens.

use serde::Deserialize;

use crate::{Error, Result};

/// Icon shown on the matrix after the scrolling reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Icon {
    #[default]
    Sun,
    Moon,
    CloudySun,
    CloudyNight,
    Rain,
    Snow,
    Sleet,
    Fog,
}

impl Icon {
    pub const ALL: [Icon; 8] = [
        Icon::Sun,
        Icon::Moon,
        Icon::CloudySun,
        Icon::CloudyNight,
        Icon::Rain,
        Icon::Snow,
        Icon::Sleet,
        Icon::Fog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Sun => "sun",
            Icon::Moon => "moon",
            Icon::CloudySun => "cloudy_sun",
            Icon::CloudyNight => "cloudy_night",
            Icon::Rain => "rain",
            Icon::Snow => "snow",
            Icon::Sleet => "sleet",
            Icon::Fog => "fog",
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote source of the current forecast icon token (e.g. `nt_partlycloudy`).
pub trait ForecastSource: Send + Sync {
    fn fetch_icon_token(&self) -> Result<String>;
}

const NIGHT_MARKER: &str = "nt_";

enum Category {
    Fixed(Icon),
    DayNight { day: Icon, night: Icon },
}

struct Rule {
    keywords: &'static [&'static str],
    category: Category,
}

// Evaluated top to bottom; the first rule with a matching keyword wins, so a
// token such as "chancerain_cloudy" resolves to rain.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["flurries", "snow"],
        category: Category::Fixed(Icon::Snow),
    },
    Rule {
        keywords: &["rain", "storm"],
        category: Category::Fixed(Icon::Rain),
    },
    Rule {
        keywords: &["cloudy", "hazy", "mostlycloud", "partlysunny"],
        category: Category::DayNight {
            day: Icon::CloudySun,
            night: Icon::CloudyNight,
        },
    },
    Rule {
        keywords: &["clear", "sunny"],
        category: Category::DayNight {
            day: Icon::Sun,
            night: Icon::Moon,
        },
    },
    Rule {
        keywords: &["sleet"],
        category: Category::Fixed(Icon::Sleet),
    },
    Rule {
        keywords: &["fog"],
        category: Category::Fixed(Icon::Fog),
    },
];

/// Map a forecast icon token to a display icon.
pub fn icon_for_token(token: &str) -> Icon {
    let night = token.contains(NIGHT_MARKER);
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| token.contains(kw)))
        .map(|rule| match rule.category {
            Category::Fixed(icon) => icon,
            Category::DayNight { day, night: nt } => {
                if night {
                    nt
                } else {
                    day
                }
            }
        })
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct ForecastResponse {
    forecast: Forecast,
}

#[derive(Deserialize)]
struct Forecast {
    simpleforecast: SimpleForecast,
}

#[derive(Deserialize)]
struct SimpleForecast {
    forecastday: Vec<ForecastDay>,
}

#[derive(Deserialize)]
struct ForecastDay {
    icon: String,
}

/// Extract `forecast.simpleforecast.forecastday[0].icon` from a forecast payload.
pub fn parse_icon_token(raw: &str) -> Result<String> {
    let response: ForecastResponse =
        serde_json::from_str(raw).map_err(|e| Error::Parse(format!("forecast payload: {e}")))?;
    response
        .forecast
        .simpleforecast
        .forecastday
        .into_iter()
        .next()
        .map(|day| day.icon)
        .ok_or_else(|| Error::Parse("forecast payload has no forecast days".into()))
}
