use crate::{
    Config,
    error::WeatherError,
    model::{Location, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

mod normalize;
pub mod openweather;

/// How many forecast points make up the hourly strip.
pub const HOURLY_POINTS: usize = 8;
/// Upper bound on distinct days in the daily strip.
pub const MAX_DAYS: usize = 7;
/// Geocoding result limit requested from the provider.
pub const GEOCODE_LIMIT: usize = 5;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions, forecast and (best-effort) air quality for a point.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError>;

    /// Candidate places for free text. Blank queries resolve to nothing without a request.
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError>;
}

pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), WeatherError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(WeatherError::InvalidCoordinates { lat, lon });
    }
    Ok(())
}

/// Construct the provider from config. Fails fast when no API key is available.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let provider = OpenWeatherProvider::from_config(config)?;
    Ok(Arc::new(provider))
}
