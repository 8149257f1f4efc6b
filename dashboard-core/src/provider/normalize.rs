//! Turns raw OpenWeather payloads into a [`WeatherSnapshot`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::{ProviderError, Stage},
    model::{
        AirQuality, CurrentConditions, DailyForecast, HourlyForecast, SnapshotLocation,
        WeatherSnapshot,
    },
    units::{meters_to_km, mps_to_kmh, round_celsius},
};

use super::{
    HOURLY_POINTS, MAX_DAYS,
    openweather::{
        OwAirResponse, OwCurrentResponse, OwForecastEntry, OwForecastResponse, OwWeather,
    },
};

pub(super) fn snapshot(
    current: OwCurrentResponse,
    forecast: OwForecastResponse,
    air: Option<OwAirResponse>,
) -> Result<WeatherSnapshot, ProviderError> {
    if forecast.list.is_empty() {
        return Err(ProviderError::malformed(
            Stage::Forecast,
            "OpenWeather forecast response contained no data",
        ));
    }

    let sunrise = unix_to_utc(Stage::Current, current.sys.sunrise)?;
    let sunset = unix_to_utc(Stage::Current, current.sys.sunset)?;

    let hourly = hourly(&forecast.list)?;
    let daily = daily(&forecast.list, sunrise, sunset)?;

    let condition = primary(&current.weather);
    let conditions = CurrentConditions {
        temp: round_celsius(current.main.temp),
        feels_like: round_celsius(current.main.feels_like.unwrap_or(current.main.temp)),
        humidity: percent(current.main.humidity.unwrap_or(0.0)),
        pressure: current.main.pressure.unwrap_or(0.0).round().max(0.0) as u32,
        visibility: meters_to_km(current.visibility.unwrap_or(0.0)),
        uv_index: None,
        wind_speed: mps_to_kmh(current.wind.speed),
        wind_direction: current.wind.deg.unwrap_or(0.0).round().rem_euclid(360.0) as u16,
        weather_code: condition.code,
        weather_description: condition.description.to_string(),
        icon: condition.icon.to_string(),
    };

    Ok(WeatherSnapshot {
        location: SnapshotLocation {
            name: current.name,
            country: current.sys.country,
            lat: current.coord.lat,
            lon: current.coord.lon,
        },
        current: conditions,
        hourly,
        daily,
        air_quality: air.and_then(air_quality),
    })
}

/// The first forecast points, in provider order.
pub(super) fn hourly(points: &[OwForecastEntry]) -> Result<Vec<HourlyForecast>, ProviderError> {
    points
        .iter()
        .take(HOURLY_POINTS)
        .map(|point| {
            let condition = primary(&point.weather);
            Ok(HourlyForecast {
                time: unix_to_utc(Stage::Forecast, point.dt)?,
                temp: round_celsius(point.main.temp),
                weather_code: condition.code,
                icon: condition.icon.to_string(),
                precipitation_probability: percent(point.pop.unwrap_or(0.0) * 100.0),
            })
        })
        .collect()
}

struct DayBucket<'a> {
    date: NaiveDate,
    first: &'a OwForecastEntry,
    max: f64,
    min: f64,
}

/// Groups points by UTC calendar date in order of first appearance.
///
/// Code, icon and precipitation come from the first point of each date.
pub(super) fn daily(
    points: &[OwForecastEntry],
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
) -> Result<Vec<DailyForecast>, ProviderError> {
    let mut buckets: Vec<DayBucket<'_>> = Vec::new();

    for point in points {
        let date = unix_to_utc(Stage::Forecast, point.dt)?.date_naive();
        let temp = point.main.temp;

        match buckets.iter_mut().find(|b| b.date == date) {
            Some(bucket) => {
                bucket.max = bucket.max.max(temp);
                bucket.min = bucket.min.min(temp);
            }
            None => buckets.push(DayBucket { date, first: point, max: temp, min: temp }),
        }
    }

    Ok(buckets
        .into_iter()
        .take(MAX_DAYS)
        .map(|bucket| {
            let condition = primary(&bucket.first.weather);
            DailyForecast {
                date: bucket.date,
                temp_max: round_celsius(bucket.max),
                temp_min: round_celsius(bucket.min),
                weather_code: condition.code,
                icon: condition.icon.to_string(),
                precipitation_probability: percent(bucket.first.pop.unwrap_or(0.0) * 100.0),
                sunrise,
                sunset,
            }
        })
        .collect())
}

fn air_quality(air: OwAirResponse) -> Option<AirQuality> {
    let entry = air.list.into_iter().next()?;
    Some(AirQuality {
        aqi: entry.main.aqi,
        co: entry.components.co,
        no2: entry.components.no2,
        o3: entry.components.o3,
        pm2_5: entry.components.pm2_5,
        pm10: entry.components.pm10,
    })
}

struct Condition<'a> {
    code: u16,
    description: &'a str,
    icon: &'a str,
}

fn primary(weather: &[OwWeather]) -> Condition<'_> {
    match weather.first() {
        Some(w) => Condition { code: w.id, description: &w.description, icon: &w.icon },
        None => Condition { code: 0, description: "Unknown", icon: "" },
    }
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn unix_to_utc(stage: Stage, ts: i64) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| ProviderError::malformed(stage, format!("timestamp {ts} out of range")))
}
