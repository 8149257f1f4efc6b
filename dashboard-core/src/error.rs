//! Error taxonomy shared by the pipeline.
//!
//! Weather fetches propagate [`WeatherError`]; location search never does.
//! [`PersistenceError`] is only ever logged by the stores.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Upstream request that produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Current,
    Forecast,
    AirQuality,
    Geocoding,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Current => "current",
            Stage::Forecast => "forecast",
            Stage::AirQuality => "air quality",
            Stage::Geocoding => "geocoding",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to the weather provider.
#[derive(Debug, Clone, Error)]
#[error("OpenWeather {stage} request failed: {message}")]
pub struct ProviderError {
    pub stage: Stage,
    /// HTTP status, when the provider answered at all.
    pub status: Option<u16>,
    /// Network or timeout failure; worth retrying by the caller.
    pub transient: bool,
    pub message: String,
}

impl ProviderError {
    pub fn status(stage: Stage, status: u16, message: impl Into<String>) -> Self {
        Self { stage, status: Some(status), transient: false, message: message.into() }
    }

    /// The request URL carries the API key, so it is stripped from the message.
    pub fn transport(stage: Stage, err: reqwest::Error) -> Self {
        let err = err.without_url();
        let transient = err.is_timeout() || err.is_connect() || err.is_request();
        Self {
            stage,
            status: err.status().map(|s| s.as_u16()),
            transient,
            message: err.to_string(),
        }
    }

    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        Self { stage, status: None, transient: false, message: message.into() }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WeatherError {
    /// Missing or empty API credential. Never retried.
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid coordinates ({lat}, {lon}): latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl WeatherError {
    pub fn missing_api_key() -> Self {
        WeatherError::Configuration("OpenWeatherMap API key is not configured".to_string())
    }

    /// Whether showing a retry affordance makes sense for this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            WeatherError::Configuration(_) | WeatherError::InvalidCoordinates { .. }
        )
    }
}

/// Geolocation failures, phrased for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location access denied by user")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Failed to get location: {0}")]
    LocationUnavailable(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access storage at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
