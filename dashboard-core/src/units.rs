//! Unit conversion and human-facing classification of weather values.
//!
//! All rounding here is `f64::round`, i.e. half away from zero.

use serde::{Deserialize, Serialize};

pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32
}

pub fn fahrenheit_to_celsius(fahrenheit: i32) -> i32 {
    ((f64::from(fahrenheit) - 32.0) * 5.0 / 9.0).round() as i32
}

pub fn round_celsius(value: f64) -> i32 {
    value.round() as i32
}

/// m/s to whole km/h.
pub fn mps_to_kmh(speed: f64) -> u32 {
    (speed * 3.6).round().max(0.0) as u32
}

/// Metres to whole kilometres.
pub fn meters_to_km(meters: f64) -> u32 {
    (meters / 1000.0).round().max(0.0) as u32
}

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees.
pub fn wind_direction_label(degrees: u16) -> &'static str {
    let index = (f64::from(degrees) / 22.5).round() as usize % COMPASS.len();
    COMPASS[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiLevel {
    /// Provider AQI is an ordinal 1..=5.
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            0..=1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            _ => AqiLevel::VeryPoor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
        }
    }
}

pub fn humidity_level(humidity: u8) -> &'static str {
    match humidity {
        0..30 => "Low",
        30..60 => "Comfortable",
        60..80 => "High",
        _ => "Very High",
    }
}

pub fn pressure_level(hpa: u32) -> &'static str {
    match hpa {
        0..1000 => "Low",
        1000..1020 => "Normal",
        _ => "High",
    }
}

pub fn visibility_level(km: u32) -> &'static str {
    match km {
        10.. => "Excellent",
        5..10 => "Good",
        _ => "Limited",
    }
}

/// Compares apparent and actual temperature; within 2 degrees counts as similar.
pub fn feels_like_label(temp: i32, feels_like: i32) -> &'static str {
    if (feels_like - temp).abs() <= 2 {
        "Similar to actual"
    } else if feels_like > temp {
        "Warmer than actual"
    } else {
        "Cooler than actual"
    }
}

/// Coarse grouping of provider condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGroup {
    Rainy,
    Snowy,
    Cloudy,
    Clear,
}

impl ConditionGroup {
    pub fn from_code(code: u16) -> Self {
        match code {
            200..600 => ConditionGroup::Rainy,
            600..700 => ConditionGroup::Snowy,
            800 => ConditionGroup::Clear,
            _ => ConditionGroup::Cloudy,
        }
    }
}

/// Emoji glyph for a provider condition code; unknown codes fall back to clear sky.
pub fn weather_glyph(code: u16, is_day: bool) -> &'static str {
    match code {
        210 | 211 => "🌩️",
        200..300 => "⛈️",
        300 | 301 | 310 | 500 | 520 => "🌦️",
        511 | 600 | 611..=620 => "🌨️",
        300..600 => "🌧️",
        601..=602 | 621 | 622 => "❄️",
        701 | 721 | 741 => "🌫️",
        762 => "🌋",
        781 => "🌪️",
        700..800 => "💨",
        800 if is_day => "☀️",
        800 => "🌙",
        801 if is_day => "🌤️",
        801 => "☁️",
        802 => "⛅",
        803 | 804 => "☁️",
        _ if is_day => "☀️",
        _ => "🌙",
    }
}
