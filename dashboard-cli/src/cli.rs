use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use dashboard_core::{
    AppContext, Config, DashboardError, Location, UserLocation, ViewState,
    config::HomeConfig,
    preferences::{NotificationSetting, SettingUpdate, parse_bool},
    provider::validate_coordinates,
    server::{self, AppState},
    view::apply_preferences,
};
use inquire::{Password, Select};
use tracing::{debug, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and optional home coordinates.
    Configure {
        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,

        /// Latitude used for "current location".
        #[arg(long, requires = "home_lon", allow_negative_numbers = true)]
        home_lat: Option<f64>,

        #[arg(long, requires = "home_lat", allow_negative_numbers = true)]
        home_lon: Option<f64>,
    },

    /// Show the dashboard for a place, coordinates, or the remembered location.
    Show {
        /// Place name; the best geocoding match is used.
        #[arg(conflicts_with_all = ["lat", "here"])]
        query: Option<String>,

        #[arg(long, requires = "lon", conflicts_with = "here", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Use the configured home coordinates as the current location.
        #[arg(long)]
        here: bool,

        /// Print the display model as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Look up places by name.
    Search {
        query: String,
    },

    /// Manage saved locations.
    Locations {
        #[command(subcommand)]
        action: LocationsCommand,
    },

    /// Inspect or change display preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Run the HTTP API that fronts OpenWeather.
    Serve {
        /// Address to listen on; defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocationsCommand {
    List,

    /// Search and save a place.
    Add {
        query: String,

        /// Take the first match instead of prompting.
        #[arg(long)]
        first: bool,
    },

    /// Remove by the number shown in `list`.
    Remove { index: usize },

    /// Make a saved location the current one.
    Use { index: usize },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,

    /// e.g. `set temperatureUnit fahrenheit` or `set show-air-quality off`.
    Set { key: String, value: String },

    /// e.g. `notify rainAlerts on`.
    Notify { key: String, value: String },

    /// Switch between Celsius and Fahrenheit.
    ToggleUnit,

    Reset,
}

/// Where `show` should look.
enum Target {
    Query(String),
    Coordinates { lat: f64, lon: f64 },
    Here,
    Remembered,
}

impl Cli {
    pub fn is_server(&self) -> bool {
        matches!(self.command, Command::Serve { .. })
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { api_key, home_lat, home_lon } => {
                let home = home_lat.zip(home_lon).map(|(lat, lon)| HomeConfig { lat, lon });
                configure(api_key, home)
            }
            Command::Show { query, lat, lon, here, json } => {
                let target = match (query, lat.zip(lon), here) {
                    (_, _, true) => Target::Here,
                    (_, Some((lat, lon)), _) => Target::Coordinates { lat, lon },
                    (Some(query), _, _) => Target::Query(query),
                    (None, None, false) => Target::Remembered,
                };
                show(&mut context()?, target, json).await
            }
            Command::Search { query } => {
                let mut ctx = context()?;
                ctx.provider()?;
                let results = ctx.locations.search(&query).await;
                if results.is_empty() {
                    println!("No locations found for '{query}'.");
                }
                for (i, location) in results.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, render::location_line(location));
                }
                Ok(())
            }
            Command::Locations { action } => locations(&mut context()?, action).await,
            Command::Settings { action } => settings(&mut context()?, action),
            Command::Serve { bind } => {
                let ctx = context()?;
                let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
                let provider = ctx
                    .provider()
                    .inspect_err(|err| warn!(error = %err, "serving without a weather provider"))
                    .ok();
                server::serve(&bind, AppState::new(provider)).await
            }
        }
    }
}

fn context() -> Result<AppContext> {
    AppContext::load(Config::load()?)
}

fn configure(api_key: Option<String>, home: Option<HomeConfig>) -> Result<()> {
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeatherMap API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    if api_key.trim().is_empty() {
        bail!("API key cannot be empty");
    }
    config.set_api_key(api_key);

    if let Some(home) = home {
        validate_coordinates(home.lat, home.lon)?;
        config.home = Some(home);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(ctx: &mut AppContext, target: Target, json: bool) -> Result<()> {
    let dashboard = ctx.dashboard()?;
    let location = resolve_location(ctx, target).await?;

    let snapshot = match dashboard.load(location.clone()).await {
        Ok(snapshot) => snapshot,
        Err(DashboardError::Weather(err)) if err.is_retryable() => {
            bail!("{err}\nThis may be temporary; try again in a moment.")
        }
        Err(err) => return Err(err.into()),
    };

    let view = apply_preferences(&snapshot, &location, ctx.preferences.settings());
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let updated = match dashboard.state() {
        ViewState::Ready { fetched_at, .. } => {
            Some(ctx.preferences.format_time(&fetched_at.with_timezone(&Local)))
        }
        _ => None,
    };
    render::dashboard(&view, updated.as_deref());
    Ok(())
}

async fn resolve_location(ctx: &mut AppContext, target: Target) -> Result<UserLocation> {
    match target {
        Target::Here => locate_here(ctx).await,
        Target::Coordinates { lat, lon } => {
            validate_coordinates(lat, lon)?;
            Ok(ctx.locations.set_current(UserLocation::coordinates(lat, lon)).clone())
        }
        Target::Query(query) => {
            let location = pick_location(ctx, &query, false).await?;
            Ok(ctx.locations.set_current(UserLocation::from(&location)).clone())
        }
        Target::Remembered => {
            if let Some(current) = ctx.locations.current() {
                return Ok(current.clone());
            }
            if ctx.preferences.settings().auto_location {
                match locate_here(ctx).await {
                    Ok(location) => return Ok(location),
                    Err(err) => debug!(error = %err, "automatic location failed"),
                }
            }
            bail!("No location selected. Pass a place name, --lat/--lon, or --here.")
        }
    }
}

async fn locate_here(ctx: &mut AppContext) -> Result<UserLocation> {
    let geolocator = ctx.geolocator.clone();
    let location = ctx.locations.current_from_geolocation(&geolocator).await?;
    Ok(location.clone())
}

/// Search and choose one result, prompting only when asked to and there is a choice.
async fn pick_location(ctx: &mut AppContext, query: &str, interactive: bool) -> Result<Location> {
    ctx.provider()?;
    let mut results = ctx.locations.search(query).await.to_vec();

    if results.is_empty() {
        bail!("No locations found for '{query}'");
    }
    if !interactive || results.len() == 1 {
        return Ok(results.swap_remove(0));
    }

    let labels: Vec<String> = results.iter().map(render::location_line).collect();
    let choice = Select::new("Which location?", labels)
        .raw_prompt()
        .context("Failed to read selection")?;
    Ok(results.swap_remove(choice.index))
}

async fn locations(ctx: &mut AppContext, action: LocationsCommand) -> Result<()> {
    match action {
        LocationsCommand::List => {
            let current = ctx.locations.current();
            if ctx.locations.saved().is_empty() {
                println!("No saved locations.");
            }
            for (i, location) in ctx.locations.saved().iter().enumerate() {
                let marker = match current {
                    Some(c) if c.same_place(&UserLocation::from(location)) => "*",
                    _ => " ",
                };
                println!("{marker}{:>3}. {}", i + 1, render::location_line(location));
            }
        }
        LocationsCommand::Add { query, first } => {
            let location = pick_location(ctx, &query, !first).await?;
            if ctx.locations.is_saved(&location) {
                println!("{} is already saved.", location.display_name());
            } else {
                println!("Saved {}.", location.display_name());
                ctx.locations.save(location);
            }
        }
        LocationsCommand::Remove { index } => {
            let location = saved_at(ctx, index)?;
            ctx.locations.remove(&location);
            println!("Removed {}.", location.display_name());
        }
        LocationsCommand::Use { index } => {
            let location = saved_at(ctx, index)?;
            ctx.locations.set_current(UserLocation::from(&location));
            println!("Now showing {}.", location.display_name());
        }
    }
    Ok(())
}

fn saved_at(ctx: &AppContext, index: usize) -> Result<Location> {
    index
        .checked_sub(1)
        .and_then(|i| ctx.locations.saved().get(i))
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "No saved location #{index}; there are {} saved",
                ctx.locations.saved().len()
            )
        })
}

fn settings(ctx: &mut AppContext, action: SettingsCommand) -> Result<()> {
    let prefs = &mut ctx.preferences;
    let settings = match action {
        SettingsCommand::Show => prefs.settings(),
        SettingsCommand::Set { key, value } => prefs.update(SettingUpdate::parse(&key, &value)?),
        SettingsCommand::Notify { key, value } => {
            let key: NotificationSetting = key.parse()?;
            prefs.update_notification(key, parse_bool(&value)?)
        }
        SettingsCommand::ToggleUnit => prefs.toggle_temperature_unit(),
        SettingsCommand::Reset => prefs.reset(),
    };
    render::settings(settings);
    Ok(())
}
