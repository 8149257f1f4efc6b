//! User display preferences with load-merge-persist semantics.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    storage::{KeyValueStore, SETTINGS_KEY, write_json},
    units::{celsius_to_fahrenheit, fahrenheit_to_celsius},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow!("Unknown temperature unit '{s}'. Expected celsius or fahrenheit.")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(anyhow!("Unknown theme '{s}'. Expected light, dark or system.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    pub enabled: bool,
    pub daily_forecast: bool,
    pub severe_weather: bool,
    pub rain_alerts: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self { enabled: false, daily_forecast: false, severe_weather: true, rain_alerts: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub temperature_unit: TemperatureUnit,
    pub theme: Theme,
    /// Minutes. Advisory only; nothing schedules refreshes from it.
    pub refresh_interval: u32,
    pub notifications: Notifications,
    pub auto_location: bool,
    pub show_air_quality: bool,
    #[serde(rename = "show24HourTime")]
    pub show_24_hour_time: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            theme: Theme::System,
            refresh_interval: 30,
            notifications: Notifications::default(),
            auto_location: true,
            show_air_quality: true,
            show_24_hour_time: true,
        }
    }
}

impl Settings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_interval) * 60)
    }

    /// Overlay a persisted blob onto the defaults, key by key.
    ///
    /// Top-level keys replace defaults wholesale except `notifications`, which is
    /// merged one level deeper. Unknown keys are dropped, and a value this build
    /// cannot read keeps that key's default without touching the others.
    pub fn merged_over_defaults(persisted: &str) -> Result<Self> {
        let persisted: Value = serde_json::from_str(persisted)?;
        let Value::Object(persisted) = persisted else {
            bail!("settings blob is not a JSON object");
        };

        let mut merged = match serde_json::to_value(Settings::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in persisted {
            match (merged.get(&key), value) {
                (Some(Value::Object(_)), Value::Object(overrides)) if key == "notifications" => {
                    for (k, v) in overrides {
                        overlay(&mut merged, &[key.as_str(), k.as_str()], v);
                    }
                }
                (Some(_), value) => overlay(&mut merged, &[key.as_str()], value),
                (None, _) => {}
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

/// Set one known setting, reverting it if the result no longer reads as [`Settings`].
fn overlay(merged: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some(slot) = slot_mut(merged, path) else {
        return;
    };
    let previous = std::mem::replace(slot, value);

    if let Err(err) = serde_json::from_value::<Settings>(Value::Object(merged.clone())) {
        warn!(key = %path.join("."), error = %err, "ignoring unreadable stored setting");
        if let Some(slot) = slot_mut(merged, path) {
            *slot = previous;
        }
    }
}

fn slot_mut<'a>(map: &'a mut Map<String, Value>, path: &[&str]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(map.get_mut(*first)?, |value, key| value.as_object_mut()?.get_mut(*key))
}

/// One top-level setting and its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    TemperatureUnit(TemperatureUnit),
    Theme(Theme),
    RefreshInterval(u32),
    Notifications(Notifications),
    AutoLocation(bool),
    ShowAirQuality(bool),
    Show24HourTime(bool),
}

impl SettingUpdate {
    /// Parse `key value` as typed on a command line. Keys accept the persisted
    /// camelCase names or kebab-case.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let update = match normalize_key(key).as_str() {
            "temperatureunit" => SettingUpdate::TemperatureUnit(value.parse()?),
            "theme" => SettingUpdate::Theme(value.parse()?),
            "refreshinterval" => {
                let minutes: u32 = value
                    .parse()
                    .map_err(|_| anyhow!("refreshInterval must be a whole number of minutes"))?;
                if minutes == 0 {
                    bail!("refreshInterval must be at least 1 minute");
                }
                SettingUpdate::RefreshInterval(minutes)
            }
            "autolocation" => SettingUpdate::AutoLocation(parse_bool(value)?),
            "showairquality" => SettingUpdate::ShowAirQuality(parse_bool(value)?),
            "show24hourtime" => SettingUpdate::Show24HourTime(parse_bool(value)?),
            _ => bail!(
                "Unknown setting '{key}'. Known settings: temperatureUnit, theme, refreshInterval, \
                 autoLocation, showAirQuality, show24HourTime."
            ),
        };
        Ok(update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSetting {
    Enabled,
    DailyForecast,
    SevereWeather,
    RainAlerts,
}

impl FromStr for NotificationSetting {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_key(s).as_str() {
            "enabled" => Ok(NotificationSetting::Enabled),
            "dailyforecast" => Ok(NotificationSetting::DailyForecast),
            "severeweather" => Ok(NotificationSetting::SevereWeather),
            "rainalerts" => Ok(NotificationSetting::RainAlerts),
            _ => Err(anyhow!(
                "Unknown notification setting '{s}'. Known: enabled, dailyForecast, severeWeather, rainAlerts."
            )),
        }
    }
}

impl fmt::Display for NotificationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationSetting::Enabled => "enabled",
            NotificationSetting::DailyForecast => "dailyForecast",
            NotificationSetting::SevereWeather => "severeWeather",
            NotificationSetting::RainAlerts => "rainAlerts",
        })
    }
}

fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_lowercase()
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(anyhow!("Expected a boolean (true/false), got '{value}'")),
    }
}

/// In-memory settings are the source of truth; storage failures are only logged.
#[derive(Debug)]
pub struct PreferencesStore {
    storage: Arc<dyn KeyValueStore>,
    settings: Settings,
}

impl PreferencesStore {
    /// Read persisted settings, falling back to defaults when absent or corrupt.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let settings = match storage.get(SETTINGS_KEY) {
            Ok(Some(raw)) => Settings::merged_over_defaults(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "stored settings are corrupt, using defaults");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!(error = %err, "failed to read stored settings, using defaults");
                Settings::default()
            }
        };

        Self { storage, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update(&mut self, update: SettingUpdate) -> &Settings {
        let s = &mut self.settings;
        match update {
            SettingUpdate::TemperatureUnit(unit) => s.temperature_unit = unit,
            SettingUpdate::Theme(theme) => s.theme = theme,
            SettingUpdate::RefreshInterval(minutes) => s.refresh_interval = minutes,
            SettingUpdate::Notifications(n) => s.notifications = n,
            SettingUpdate::AutoLocation(v) => s.auto_location = v,
            SettingUpdate::ShowAirQuality(v) => s.show_air_quality = v,
            SettingUpdate::Show24HourTime(v) => s.show_24_hour_time = v,
        }
        self.persist();
        &self.settings
    }

    pub fn update_notification(&mut self, key: NotificationSetting, value: bool) -> &Settings {
        let n = &mut self.settings.notifications;
        match key {
            NotificationSetting::Enabled => n.enabled = value,
            NotificationSetting::DailyForecast => n.daily_forecast = value,
            NotificationSetting::SevereWeather => n.severe_weather = value,
            NotificationSetting::RainAlerts => n.rain_alerts = value,
        }
        self.persist();
        &self.settings
    }

    pub fn reset(&mut self) -> &Settings {
        self.settings = Settings::default();
        self.persist();
        &self.settings
    }

    pub fn toggle_temperature_unit(&mut self) -> &Settings {
        let unit = self.settings.temperature_unit.toggled();
        self.update(SettingUpdate::TemperatureUnit(unit))
    }

    /// Convert a canonical value (Celsius unless stated) into the preferred unit.
    pub fn convert_temperature(&self, value: i32, from: TemperatureUnit) -> i32 {
        convert_temperature(value, from, self.settings.temperature_unit)
    }

    pub fn temperature_symbol(&self) -> &'static str {
        self.settings.temperature_unit.symbol()
    }

    pub fn format_time<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        format_time(time, self.settings.show_24_hour_time)
    }

    fn persist(&self) {
        if let Err(err) = write_json(self.storage.as_ref(), SETTINGS_KEY, &self.settings) {
            warn!(error = %err, "failed to persist settings, keeping them in memory");
        }
    }
}

pub fn convert_temperature(value: i32, from: TemperatureUnit, to: TemperatureUnit) -> i32 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => celsius_to_fahrenheit(value),
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => fahrenheit_to_celsius(value),
        _ => value,
    }
}

pub fn format_time<Tz: TimeZone>(time: &DateTime<Tz>, twenty_four_hour: bool) -> String
where
    Tz::Offset: fmt::Display,
{
    if twenty_four_hour {
        time.format("%H:%M").to_string()
    } else {
        time.format("%I:%M %p").to_string()
    }
}
