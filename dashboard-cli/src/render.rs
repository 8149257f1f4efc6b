//! Plain-text output for the terminal.

use dashboard_core::{Location, Settings, view::DashboardView};

pub fn location_line(location: &Location) -> String {
    let region = location.state.as_deref().map(|s| format!(" ({s})")).unwrap_or_default();
    format!(
        "{}{region}  {:.4}, {:.4}",
        location.display_name(),
        location.lat,
        location.lon
    )
}

pub fn dashboard(view: &DashboardView, updated: Option<&str>) {
    let pin = if view.is_current_location { "📍 " } else { "" };
    let c = &view.current;
    let unit = view.symbol;

    println!("{pin}{}", view.title);
    println!("{} {}{unit}  {}", c.glyph, c.temp, c.description);
    println!();
    println!("  Feels like  {}{unit} ({})", c.feels_like, c.feels_like_label);
    println!("  Humidity    {}% ({})", c.humidity, c.humidity_label);
    println!("  Pressure    {} hPa ({})", c.pressure, c.pressure_label);
    println!("  Visibility  {} km ({})", c.visibility, c.visibility_label);
    println!("  Wind        {} km/h {} ({}°)", c.wind_speed, c.wind_label, c.wind_direction);
    match c.uv_index {
        Some(uv) => println!("  UV index    {uv:.1}"),
        None => println!("  UV index    n/a"),
    }

    if let Some(aq) = &view.air_quality {
        println!();
        println!(
            "Air quality  {} ({})  PM2.5 {:.1}  PM10 {:.1}",
            aq.aqi,
            aq.level.label(),
            aq.pm2_5,
            aq.pm10
        );
    }

    println!();
    println!("Next hours");
    for hour in &view.hourly {
        println!(
            "  {:>8}  {} {:>4}{unit}  {:>3}% rain",
            hour.time, hour.glyph, hour.temp, hour.precipitation_probability
        );
    }

    println!();
    println!("Forecast");
    for day in &view.daily {
        println!(
            "  {:<22} {} {:>4}{unit} / {:>4}{unit}  {:>3}% rain  sunrise {} sunset {}",
            day.label,
            day.glyph,
            day.high,
            day.low,
            day.precipitation_probability,
            day.sunrise,
            day.sunset
        );
    }

    if let Some(updated) = updated {
        println!();
        println!("Last updated {updated}");
    }
}

pub fn settings(settings: &Settings) {
    let on_off = |v: bool| if v { "on" } else { "off" };
    let n = &settings.notifications;

    println!("temperatureUnit  {}", settings.temperature_unit.symbol());
    println!("theme            {:?}", settings.theme);
    println!("refreshInterval  {} min", settings.refresh_interval);
    println!("autoLocation     {}", on_off(settings.auto_location));
    println!("showAirQuality   {}", on_off(settings.show_air_quality));
    println!("show24HourTime   {}", on_off(settings.show_24_hour_time));
    println!("notifications");
    println!("  enabled        {}", on_off(n.enabled));
    println!("  dailyForecast  {}", on_off(n.daily_forecast));
    println!("  severeWeather  {}", on_off(n.severe_weather));
    println!("  rainAlerts     {}", on_off(n.rain_alerts));
}
