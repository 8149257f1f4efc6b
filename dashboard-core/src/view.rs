//! Display model: a snapshot with the user's preferences applied.

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::{
    model::{UserLocation, WeatherSnapshot},
    preferences::{Settings, TemperatureUnit, convert_temperature, format_time},
    units::{
        AqiLevel, ConditionGroup, feels_like_label, humidity_level, pressure_level,
        visibility_level, weather_glyph, wind_direction_label,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub temp: i32,
    pub feels_like: i32,
    pub feels_like_label: &'static str,
    pub description: String,
    pub glyph: &'static str,
    pub humidity: u8,
    pub humidity_label: &'static str,
    pub pressure: u32,
    pub pressure_label: &'static str,
    pub visibility: u32,
    pub visibility_label: &'static str,
    pub wind_speed: u32,
    pub wind_direction: u16,
    pub wind_label: &'static str,
    pub uv_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourView {
    pub time: String,
    pub temp: i32,
    pub glyph: &'static str,
    pub precipitation_probability: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub label: String,
    pub high: i32,
    pub low: i32,
    pub glyph: &'static str,
    pub precipitation_probability: u8,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityView {
    pub aqi: u8,
    pub level: AqiLevel,
    pub pm2_5: f64,
    pub pm10: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub is_current_location: bool,
    pub symbol: &'static str,
    pub condition: ConditionGroup,
    pub current: CurrentView,
    pub hourly: Vec<HourView>,
    pub daily: Vec<DayView>,
    pub air_quality: Option<AirQualityView>,
}

/// Render times in the machine's local zone.
pub fn apply_preferences(
    snapshot: &WeatherSnapshot,
    location: &UserLocation,
    settings: &Settings,
) -> DashboardView {
    apply_preferences_in(snapshot, location, settings, &Local)
}

pub fn apply_preferences_in<Tz: TimeZone>(
    snapshot: &WeatherSnapshot,
    location: &UserLocation,
    settings: &Settings,
    tz: &Tz,
) -> DashboardView
where
    Tz::Offset: std::fmt::Display,
{
    let unit = settings.temperature_unit;
    let temp = |celsius: i32| convert_temperature(celsius, TemperatureUnit::Celsius, unit);
    let clock = |time: &chrono::DateTime<chrono::Utc>| {
        format_time(&time.with_timezone(tz), settings.show_24_hour_time)
    };

    let title = location.name.clone().unwrap_or_else(|| {
        format!("{}, {}", snapshot.location.name, snapshot.location.country)
    });

    let c = &snapshot.current;
    let current = CurrentView {
        temp: temp(c.temp),
        feels_like: temp(c.feels_like),
        feels_like_label: feels_like_label(c.temp, c.feels_like),
        description: c.weather_description.clone(),
        glyph: weather_glyph(c.weather_code, is_day(&c.icon)),
        humidity: c.humidity,
        humidity_label: humidity_level(c.humidity),
        pressure: c.pressure,
        pressure_label: pressure_level(c.pressure),
        visibility: c.visibility,
        visibility_label: visibility_level(c.visibility),
        wind_speed: c.wind_speed,
        wind_direction: c.wind_direction,
        wind_label: wind_direction_label(c.wind_direction),
        uv_index: c.uv_index,
    };

    let hourly = snapshot
        .hourly
        .iter()
        .map(|h| HourView {
            time: clock(&h.time),
            temp: temp(h.temp),
            glyph: weather_glyph(h.weather_code, is_day(&h.icon)),
            precipitation_probability: h.precipitation_probability,
        })
        .collect();

    let daily = snapshot
        .daily
        .iter()
        .enumerate()
        .map(|(index, d)| DayView {
            label: match index {
                0 => "Today".to_string(),
                1 => "Tomorrow".to_string(),
                _ => d.date.format("%A, %b %-d").to_string(),
            },
            high: temp(d.temp_max),
            low: temp(d.temp_min),
            glyph: weather_glyph(d.weather_code, true),
            precipitation_probability: d.precipitation_probability,
            sunrise: clock(&d.sunrise),
            sunset: clock(&d.sunset),
        })
        .collect();

    let air_quality = snapshot.air_quality.as_ref().filter(|_| settings.show_air_quality).map(|aq| {
        AirQualityView { aqi: aq.aqi, level: AqiLevel::from_index(aq.aqi), pm2_5: aq.pm2_5, pm10: aq.pm10 }
    });

    DashboardView {
        title,
        is_current_location: location.is_current_location,
        symbol: unit.symbol(),
        condition: ConditionGroup::from_code(c.weather_code),
        current,
        hourly,
        daily,
        air_quality,
    }
}

/// OpenWeather icon ids end in `n` at night.
fn is_day(icon: &str) -> bool {
    !icon.ends_with('n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::DailyForecast,
        testing::{london, sample_snapshot},
    };
    use chrono::{NaiveDate, Utc};

    fn view(settings: &Settings) -> DashboardView {
        let snapshot = sample_snapshot(51.5, -0.12);
        apply_preferences_in(&snapshot, &UserLocation::from(&london()), settings, &Utc)
    }

    #[test]
    fn celsius_view_keeps_canonical_values() {
        let v = view(&Settings::default());

        assert_eq!(v.title, "London, GB");
        assert_eq!(v.symbol, "°C");
        assert_eq!(v.current.temp, 20);
        assert_eq!(v.current.feels_like_label, "Warmer than actual");
        assert_eq!(v.current.wind_label, "SW");
        assert_eq!(v.current.uv_index, None);
        assert_eq!(v.condition, ConditionGroup::Clear);
        assert_eq!(v.hourly[1].time, "03:00");
        assert_eq!(v.daily[0].label, "Today");
        assert_eq!(v.daily[1].label, "Tomorrow");
        assert_eq!(v.daily[0].sunrise, "05:00");
    }

    #[test]
    fn fahrenheit_and_12_hour_clock() {
        let settings = Settings {
            temperature_unit: TemperatureUnit::Fahrenheit,
            show_24_hour_time: false,
            ..Settings::default()
        };
        let v = view(&settings);

        assert_eq!(v.symbol, "°F");
        assert_eq!(v.current.temp, 68);
        assert_eq!(v.current.feels_like, 77);
        assert_eq!(v.daily[0].high, celsius_to_f(16));
        assert_eq!(v.daily[0].sunset, "08:00 PM");
    }

    fn celsius_to_f(c: i32) -> i32 {
        crate::units::celsius_to_fahrenheit(c)
    }

    #[test]
    fn air_quality_follows_preference() {
        let shown = view(&Settings::default());
        let aq = shown.air_quality.unwrap();
        assert_eq!(aq.level, AqiLevel::Fair);

        let hidden = view(&Settings { show_air_quality: false, ..Settings::default() });
        assert!(hidden.air_quality.is_none());
    }

    #[test]
    fn later_days_are_named_and_untitled_locations_use_provider_name() {
        let mut snapshot = sample_snapshot(51.5, -0.12);
        let template = snapshot.daily[0].clone();
        snapshot.daily.push(DailyForecast {
            date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            ..template
        });

        let v = apply_preferences_in(
            &snapshot,
            &UserLocation::coordinates(51.5, -0.12),
            &Settings::default(),
            &Utc,
        );
        assert_eq!(v.daily[2].label, "Friday, May 3");
        assert_eq!(v.title, "London, GB");
    }
}
