use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::{
    Config,
    dashboard::Dashboard,
    error::WeatherError,
    locations::{LocationStore, StaticGeolocator},
    preferences::PreferencesStore,
    provider::{WeatherProvider, provider_from_config},
    resolver::LocationResolver,
    storage::{FileStore, KeyValueStore},
};

/// Everything a front end needs, built once at startup and passed around.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub preferences: PreferencesStore,
    pub locations: LocationStore,
    pub geolocator: StaticGeolocator,
    provider: Result<Arc<dyn WeatherProvider>, WeatherError>,
}

impl AppContext {
    /// Persist to the configured data directory.
    pub fn load(config: Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir()?));
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Self {
        let provider = provider_from_config(&config);
        if let Err(err) = &provider {
            warn!(error = %err, "weather provider unavailable");
        }

        let resolver = match &provider {
            Ok(provider) => LocationResolver::new(provider.clone()),
            Err(_) => LocationResolver::unconfigured(),
        };

        Self {
            preferences: PreferencesStore::load(storage.clone()),
            locations: LocationStore::load(storage, resolver),
            geolocator: StaticGeolocator::new(config.home),
            provider,
            config,
        }
    }

    /// The provider, or the configuration error explaining why there is none.
    pub fn provider(&self) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
        self.provider.clone()
    }

    pub fn dashboard(&self) -> Result<Dashboard, WeatherError> {
        Ok(Dashboard::new(self.provider()?))
    }
}
