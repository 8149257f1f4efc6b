use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded place as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Identity is the exact provider coordinates, never the name.
    pub fn same_place(&self, other: &Location) -> bool {
        same_coordinates((self.lat, self.lon), (other.lat, other.lon))
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

pub(crate) fn same_coordinates(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0.to_bits() == b.0.to_bits() && a.1.to_bits() == b.1.to_bits()
}

/// The single active selection driving the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_current_location: bool,
}

impl UserLocation {
    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self { lat, lon, name: None, is_current_location: false }
    }

    pub fn from_geolocation(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            name: Some("Current Location".to_string()),
            is_current_location: true,
        }
    }

    pub fn same_place(&self, other: &UserLocation) -> bool {
        same_coordinates((self.lat, self.lon), (other.lat, other.lon))
    }
}

impl From<&Location> for UserLocation {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.lat,
            lon: location.lon,
            name: Some(location.display_name()),
            is_current_location: false,
        }
    }
}

/// Where the provider says the snapshot was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions, already in display units (°C, km/h, km, hPa).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: i32,
    pub feels_like: i32,
    pub humidity: u8,
    pub pressure: u32,
    pub visibility: u32,
    /// Unknown until a UV source is wired in; never conflate with zero UV.
    pub uv_index: Option<f64>,
    pub wind_speed: u32,
    pub wind_direction: u16,
    pub weather_code: u16,
    pub weather_description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temp: i32,
    pub weather_code: u16,
    pub icon: String,
    pub precipitation_probability: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_max: i32,
    pub temp_min: i32,
    pub weather_code: u16,
    pub icon: String,
    pub precipitation_probability: u8,
    /// Same value for every day: the provider only reports today's.
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub aqi: u8,
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

/// One immutable weather result for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: SnapshotLocation,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
}
