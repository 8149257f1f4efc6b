//! Current, saved and searched locations, plus the geolocation seam.

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::HomeConfig,
    error::LocationError,
    model::{Location, UserLocation},
    resolver::LocationResolver,
    storage::{CURRENT_LOCATION_KEY, KeyValueStore, SAVED_LOCATIONS_KEY, read_json, write_json},
};

/// What the caller asks of the platform when acquiring a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A cached fix younger than this is acceptable.
    pub max_cached_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_cached_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

/// Platform failure using the W3C geolocation codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeolocationFailure {
    pub code: u16,
    pub message: String,
}

impl GeolocationFailure {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<GeolocationFailure> for LocationError {
    fn from(failure: GeolocationFailure) -> Self {
        match failure.code {
            GeolocationFailure::PERMISSION_DENIED => LocationError::PermissionDenied,
            GeolocationFailure::POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
            GeolocationFailure::TIMEOUT => LocationError::Timeout,
            _ => LocationError::LocationUnavailable(failure.message),
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationFailure>;
}

/// Hands out fixed coordinates, or "unavailable" when none are configured.
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    home: Option<Position>,
}

impl StaticGeolocator {
    pub fn new(home: Option<HomeConfig>) -> Self {
        Self { home: home.map(|h| Position { lat: h.lat, lon: h.lon }) }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Position, GeolocationFailure> {
        self.home.ok_or_else(|| {
            GeolocationFailure::new(
                GeolocationFailure::POSITION_UNAVAILABLE,
                "no home coordinates configured",
            )
        })
    }
}

#[derive(Debug)]
pub struct LocationStore {
    storage: Arc<dyn KeyValueStore>,
    resolver: LocationResolver,
    current: Option<UserLocation>,
    saved: Vec<Location>,
    search_results: Vec<Location>,
}

impl LocationStore {
    pub fn load(storage: Arc<dyn KeyValueStore>, resolver: LocationResolver) -> Self {
        let current = load_slot::<UserLocation>(storage.as_ref(), CURRENT_LOCATION_KEY);
        let saved = load_slot::<Vec<Location>>(storage.as_ref(), SAVED_LOCATIONS_KEY)
            .unwrap_or_default();

        Self { storage, resolver, current, saved, search_results: Vec::new() }
    }

    pub fn current(&self) -> Option<&UserLocation> {
        self.current.as_ref()
    }

    /// Make `location` the active selection and remember it across sessions.
    pub fn set_current(&mut self, location: UserLocation) -> &UserLocation {
        persist(self.storage.as_ref(), CURRENT_LOCATION_KEY, &location);
        self.current.insert(location)
    }

    pub fn saved(&self) -> &[Location] {
        &self.saved
    }

    pub fn is_saved(&self, location: &Location) -> bool {
        self.saved.iter().any(|s| s.same_place(location))
    }

    /// Append unless a location with identical coordinates is already saved.
    pub fn save(&mut self, location: Location) -> &[Location] {
        if self.is_saved(&location) {
            debug!(name = %location.name, "location already saved");
            return &self.saved;
        }
        self.saved.push(location);
        persist(self.storage.as_ref(), SAVED_LOCATIONS_KEY, &self.saved);
        &self.saved
    }

    pub fn remove(&mut self, location: &Location) -> &[Location] {
        let before = self.saved.len();
        self.saved.retain(|s| !s.same_place(location));
        if self.saved.len() != before {
            persist(self.storage.as_ref(), SAVED_LOCATIONS_KEY, &self.saved);
        }
        &self.saved
    }

    pub async fn search(&mut self, query: &str) -> &[Location] {
        self.search_results = self.resolver.search(query).await;
        &self.search_results
    }

    pub fn search_results(&self) -> &[Location] {
        &self.search_results
    }

    /// Ask the platform for a fix and make it the current location.
    pub async fn current_from_geolocation(
        &mut self,
        geolocator: &dyn Geolocator,
    ) -> Result<&UserLocation, LocationError> {
        let position = acquire_position(geolocator, &GeolocationOptions::default()).await?;
        Ok(self.set_current(UserLocation::from_geolocation(position.lat, position.lon)))
    }
}

/// Query the capability, enforcing the timeout even if the platform does not.
pub async fn acquire_position(
    geolocator: &dyn Geolocator,
    options: &GeolocationOptions,
) -> Result<Position, LocationError> {
    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(Ok(position)) => Ok(position),
        Ok(Err(failure)) => {
            warn!(code = failure.code, message = %failure.message, "geolocation failed");
            Err(failure.into())
        }
        Err(_) => {
            warn!(timeout = ?options.timeout, "geolocation timed out");
            Err(LocationError::Timeout)
        }
    }
}

fn load_slot<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str) -> Option<T> {
    read_json(storage, key).unwrap_or_else(|err| {
        warn!(key, error = %err, "ignoring unreadable location slot");
        None
    })
}

fn persist<T: serde::Serialize>(storage: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(err) = write_json(storage, key, value) {
        warn!(key, error = %err, "failed to persist locations, keeping them in memory");
    }
}
