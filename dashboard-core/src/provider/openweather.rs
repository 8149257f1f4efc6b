use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    Config,
    config::ProviderConfig,
    error::{ProviderError, Stage, WeatherError},
    model::{Location, WeatherSnapshot},
};

use super::{GEOCODE_LIMIT, WeatherProvider, normalize, validate_coordinates};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    geo_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, config: &ProviderConfig) -> Result<Self, WeatherError> {
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(WeatherError::missing_api_key());
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| WeatherError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_url: config.geo_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let api_key = config.api_key().ok_or_else(WeatherError::missing_api_key)?;
        Self::new(api_key, &config.provider)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        stage: Stage,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::transport(stage, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ProviderError::transport(stage, e))?;

        if !status.is_success() {
            return Err(ProviderError::status(
                stage,
                status.as_u16(),
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::malformed(stage, format!("Failed to parse OpenWeather {stage} JSON: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwWeather {
    pub id: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwMain {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct OwWind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwSys {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwCurrentResponse {
    pub coord: OwCoord,
    #[serde(default)]
    pub name: String,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    #[serde(default)]
    pub wind: OwWind,
    /// Metres; absent in some responses.
    #[serde(default)]
    pub visibility: Option<f64>,
    pub sys: OwSys,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwForecastEntry {
    pub dt: i64,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    /// Probability of precipitation, 0.0..=1.0.
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwForecastResponse {
    #[serde(default)]
    pub list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwAirIndex {
    pub aqi: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct OwAirComponents {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwAirEntry {
    pub main: OwAirIndex,
    #[serde(default)]
    pub components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
pub(super) struct OwAirResponse {
    #[serde(default)]
    pub list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<OwGeocodeEntry> for Location {
    fn from(entry: OwGeocodeEntry) -> Self {
        Location {
            name: entry.name,
            country: entry.country,
            state: entry.state,
            lat: entry.lat,
            lon: entry.lon,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        validate_coordinates(lat, lon)?;
        debug!(lat, lon, "fetching OpenWeather current, forecast and air quality");

        let coords = [("lat", lat.to_string()), ("lon", lon.to_string())];
        let metric = [coords[0].clone(), coords[1].clone(), ("units", "metric".to_string())];

        let current = self.get_json::<OwCurrentResponse>(
            Stage::Current,
            format!("{}/weather", self.base_url),
            &metric,
        );
        let forecast = self.get_json::<OwForecastResponse>(
            Stage::Forecast,
            format!("{}/forecast", self.base_url),
            &metric,
        );
        let air = self.get_json::<OwAirResponse>(
            Stage::AirQuality,
            format!("{}/air_pollution", self.base_url),
            &coords,
        );

        // Current and forecast fail fast together; air quality is awaited but never fatal.
        let mandatory = async { tokio::try_join!(current, forecast) };
        let (mandatory, air) = tokio::join!(mandatory, air);
        let (current, forecast) = mandatory?;

        let air = match air {
            Ok(air) => Some(air),
            Err(err) => {
                warn!(error = %err, "air quality unavailable, continuing without it");
                None
            }
        };

        Ok(normalize::snapshot(current, forecast, air)?)
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        debug!(query, "geocoding location query");
        let entries = self
            .get_json::<Vec<OwGeocodeEntry>>(
                Stage::Geocoding,
                format!("{}/direct", self.geo_url),
                &[("q", query.to_string()), ("limit", GEOCODE_LIMIT.to_string())],
            )
            .await?;

        Ok(entries.into_iter().take(GEOCODE_LIMIT).map(Location::from).collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
