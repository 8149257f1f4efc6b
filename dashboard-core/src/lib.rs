//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Location resolution (search, saved/current locations, geolocation)
//! - The OpenWeather client and normalization into [`WeatherSnapshot`]
//! - User preferences and unit conversion
//! - The dashboard orchestrator and the HTTP surface
//!
//! It is used by `dashboard-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod context;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod locations;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod resolver;
pub mod server;
pub mod storage;
pub mod units;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use context::AppContext;
pub use dashboard::{Dashboard, DashboardError, ViewState};
pub use error::{LocationError, PersistenceError, ProviderError, Stage, WeatherError};
pub use model::{Location, UserLocation, WeatherSnapshot};
pub use preferences::{PreferencesStore, Settings};
pub use provider::WeatherProvider;
pub use resolver::LocationResolver;
