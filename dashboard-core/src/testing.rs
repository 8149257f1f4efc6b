//! In-crate test doubles.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use parking_lot::Mutex;

use crate::{
    error::{ProviderError, Stage, WeatherError},
    model::{
        AirQuality, CurrentConditions, DailyForecast, HourlyForecast, Location, SnapshotLocation,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
};

pub(crate) fn london() -> Location {
    Location {
        name: "London".into(),
        country: "GB".into(),
        state: Some("England".into()),
        lat: 51.5,
        lon: -0.12,
    }
}

pub(crate) fn paris() -> Location {
    Location { name: "Paris".into(), country: "FR".into(), state: None, lat: 48.85, lon: 2.35 }
}

/// A plausible snapshot whose location echoes the requested coordinates.
pub(crate) fn sample_snapshot(lat: f64, lon: f64) -> WeatherSnapshot {
    // 2024-05-01T00:00:00Z
    let start = 1_714_521_600;
    let sunrise = DateTime::from_timestamp(start + 5 * 3600, 0).unwrap();
    let sunset = DateTime::from_timestamp(start + 20 * 3600, 0).unwrap();

    WeatherSnapshot {
        location: SnapshotLocation { name: "London".into(), country: "GB".into(), lat, lon },
        current: CurrentConditions {
            temp: 20,
            feels_like: 25,
            humidity: 45,
            pressure: 1013,
            visibility: 10,
            uv_index: None,
            wind_speed: 18,
            wind_direction: 225,
            weather_code: 800,
            weather_description: "clear sky".into(),
            icon: "01d".into(),
        },
        hourly: (0..8)
            .map(|i| HourlyForecast {
                time: DateTime::from_timestamp(start + i * 3 * 3600, 0).unwrap(),
                temp: 10 + i as i32,
                weather_code: 800,
                icon: "01d".into(),
                precipitation_probability: 0,
            })
            .collect(),
        daily: (1..=2)
            .map(|day| DailyForecast {
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                temp_max: 15 + day as i32,
                temp_min: 5,
                weather_code: 500,
                icon: "10d".into(),
                precipitation_probability: 40,
                sunrise,
                sunset,
            })
            .collect(),
        air_quality: Some(AirQuality {
            aqi: 2,
            co: 201.9,
            no2: 0.8,
            o3: 68.6,
            pm2_5: 3.25,
            pm10: 7.0,
        }),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    fail_search: bool,
    weather_failure: Mutex<Option<WeatherError>>,
    slow: Mutex<Option<(f64, Duration)>>,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl FakeProvider {
    pub(crate) fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub(crate) fn failing_weather(self, err: WeatherError) -> Self {
        self.set_weather_failure(Some(err));
        self
    }

    pub(crate) fn set_weather_failure(&self, err: Option<WeatherError>) {
        *self.weather_failure.lock() = err;
    }

    /// Fetches for this latitude take `delay` before answering.
    pub(crate) fn slow_at(self, lat: f64, delay: Duration) -> Self {
        *self.slow.lock() = Some((lat, delay));
        self
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_query(&self) -> Option<String> {
        self.last_query.lock().clone()
    }
}

pub(crate) fn unauthorized() -> WeatherError {
    ProviderError::status(Stage::Current, 401, "status 401 Unauthorized: Invalid API key").into()
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = match *self.slow.lock() {
            Some((slow_lat, delay)) if slow_lat == lat => Some(delay),
            _ => None,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.weather_failure.lock().clone() {
            return Err(err);
        }
        Ok(sample_snapshot(lat, lon))
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some(query.to_string());

        if self.fail_search {
            return Err(ProviderError::status(Stage::Geocoding, 500, "boom").into());
        }
        if query.to_lowercase().starts_with("par") {
            return Ok(vec![paris()]);
        }
        Ok(vec![london()])
    }
}
