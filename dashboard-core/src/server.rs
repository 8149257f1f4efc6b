//! HTTP surface: `/weather` and `/locations/search`.
//!
//! The API key stays on this side; responses carry only normalized data or
//! an `{ "error": ... }` body.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    error::WeatherError,
    model::{Location, WeatherSnapshot},
    provider::{WeatherProvider, validate_coordinates},
    resolver::LocationResolver,
};

/// Shared handler state. `provider` is `None` when no API key is configured.
#[derive(Debug, Clone)]
pub struct AppState {
    provider: Option<Arc<dyn WeatherProvider>>,
    resolver: LocationResolver,
}

impl AppState {
    pub fn new(provider: Option<Arc<dyn WeatherProvider>>) -> Self {
        let resolver = match &provider {
            Some(provider) => LocationResolver::new(provider.clone()),
            None => LocationResolver::unconfigured(),
        };
        Self { provider, resolver }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        let status = match err {
            WeatherError::InvalidCoordinates { .. } => StatusCode::BAD_REQUEST,
            WeatherError::Configuration(_) | WeatherError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(weather))
        .route("/locations/search", get(search_locations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Weather dashboard API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await.context("HTTP server failed")
}

async fn weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    let (Some(lat), Some(lon)) = (non_empty(params.lat), non_empty(params.lon)) else {
        return Err(ApiError::bad_request("Latitude and longitude are required"));
    };
    let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) else {
        return Err(ApiError::bad_request("Latitude and longitude must be numbers"));
    };
    validate_coordinates(lat, lon)?;

    let provider = state.provider.as_ref().ok_or_else(WeatherError::missing_api_key)?;
    let snapshot = provider.fetch_weather(lat, lon).await.inspect_err(|err| {
        error!(error = %err, lat, lon, "weather request failed");
    })?;

    Ok(Json(snapshot))
}

async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let Some(query) = non_empty(params.q) else {
        return Err(ApiError::bad_request("Query parameter is required"));
    };
    Ok(Json(state.resolver.search(&query).await))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
