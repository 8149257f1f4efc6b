//! Integration tests for the OpenWeather client using wiremock
//!
//! These tests stand up a mock OpenWeather API and check normalization,
//! the fatal/non-fatal split between upstream calls, and error mapping.

use std::time::Duration;

use chrono::NaiveDate;
use dashboard_core::{
    Stage, WeatherError, WeatherProvider, config::ProviderConfig,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

/// 2024-05-01T00:00:00Z
const MAY_FIRST: i64 = 1_714_521_600;

fn create_test_client(mock_server: &MockServer) -> OpenWeatherProvider {
    let config = ProviderConfig {
        base_url: format!("{}/data/2.5", mock_server.uri()),
        geo_url: format!("{}/geo/1.0", mock_server.uri()),
        timeout_secs: 1,
    };
    OpenWeatherProvider::new("test-key".to_string(), &config).expect("Failed to create client")
}

fn current_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
        "main": {
            "temp": 14.52, "feels_like": 13.9, "temp_min": 13.1, "temp_max": 15.6,
            "pressure": 1012, "humidity": 72
        },
        "visibility": 9500,
        "wind": { "speed": 4.63, "deg": 250 },
        "dt": MAY_FIRST + 12 * 3600,
        "sys": { "country": "GB", "sunrise": MAY_FIRST + 4 * 3600 + 1800, "sunset": MAY_FIRST + 19 * 3600 + 900 },
        "name": "London",
        "cod": 200
    })
}

/// Sixteen 3-hourly points across 2024-05-01 and 2024-05-02.
fn forecast_response() -> serde_json::Value {
    let temps = [10.0, 12.0, 15.0, 14.0, 9.0, 8.0, 7.0, 11.0, 13.0, 16.0, 18.0, 17.0, 10.0, 9.0, 8.0, 12.0];
    let list: Vec<_> = temps
        .iter()
        .enumerate()
        .map(|(i, temp)| {
            serde_json::json!({
                "dt": MAY_FIRST + i as i64 * 3 * 3600,
                "main": { "temp": temp, "feels_like": temp, "pressure": 1010, "humidity": 70 },
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                "pop": 0.35,
                "dt_txt": "ignored"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "cnt": list.len(),
        "list": list,
        "city": { "name": "London", "country": "GB" }
    })
}

fn air_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "list": [{
            "main": { "aqi": 2 },
            "components": {
                "co": 201.94, "no": 0.02, "no2": 0.77, "o3": 68.66,
                "so2": 0.64, "pm2_5": 0.5, "pm10": 0.54, "nh3": 0.12
            },
            "dt": MAY_FIRST
        }]
    })
}

async fn mount(mock_server: &MockServer, endpoint: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/data/2.5/{endpoint}")))
        .and(query_param("appid", "test-key"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

async fn mount_all_ok(mock_server: &MockServer) {
    mount(mock_server, "weather", ResponseTemplate::new(200).set_body_json(current_response())).await;
    mount(mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(mock_server, "air_pollution", ResponseTemplate::new(200).set_body_json(air_response())).await;
}

// =============================================================================
// Weather fetch
// =============================================================================

#[tokio::test]
async fn test_fetch_weather_normalizes_snapshot() {
    let mock_server = MockServer::start().await;
    mount_all_ok(&mock_server).await;

    let client = create_test_client(&mock_server);
    let snapshot = client.fetch_weather(51.5085, -0.1257).await.unwrap();

    assert_eq!(snapshot.location.name, "London");
    assert_eq!(snapshot.location.country, "GB");

    let current = &snapshot.current;
    assert_eq!(current.temp, 15);
    assert_eq!(current.feels_like, 14);
    assert_eq!(current.humidity, 72);
    assert_eq!(current.pressure, 1012);
    assert_eq!(current.visibility, 10);
    assert_eq!(current.wind_speed, 17);
    assert_eq!(current.wind_direction, 250);
    assert_eq!(current.weather_code, 803);
    assert_eq!(current.weather_description, "broken clouds");
    assert_eq!(current.icon, "04d");
    assert_eq!(current.uv_index, None);

    assert_eq!(snapshot.hourly.len(), 8);
    assert!(snapshot.hourly.windows(2).all(|w| w[0].time < w[1].time));
    assert_eq!(snapshot.hourly[0].precipitation_probability, 35);

    assert!(snapshot.daily.len() <= 7);
    assert!(snapshot.daily.iter().all(|d| d.temp_min <= d.temp_max));

    let aq = snapshot.air_quality.expect("air quality present");
    assert_eq!(aq.aqi, 2);
    assert_eq!(aq.pm10, 0.54);
}

#[tokio::test]
async fn test_daily_grouping_across_two_dates() {
    let mock_server = MockServer::start().await;
    mount_all_ok(&mock_server).await;

    let snapshot = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.unwrap();

    assert_eq!(snapshot.daily.len(), 2);
    let (day1, day2) = (&snapshot.daily[0], &snapshot.daily[1]);
    assert_eq!(day1.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!((day1.temp_max, day1.temp_min), (15, 7));
    assert_eq!(day2.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    assert_eq!((day2.temp_max, day2.temp_min), (18, 8));
    assert_eq!(day1.sunrise, day2.sunrise);
    assert_eq!(day1.sunset.timestamp(), MAY_FIRST + 19 * 3600 + 900);
}

#[tokio::test]
async fn test_sends_metric_units_and_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_response()))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount(&mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(&mock_server, "air_pollution", ResponseTemplate::new(200).set_body_json(air_response())).await;

    assert!(create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.is_ok());
}

#[tokio::test]
async fn test_air_quality_failure_is_not_fatal() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "weather", ResponseTemplate::new(200).set_body_json(current_response())).await;
    mount(&mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(&mock_server, "air_pollution", ResponseTemplate::new(503)).await;

    let snapshot = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.unwrap();
    assert!(snapshot.air_quality.is_none());
    assert_eq!(snapshot.hourly.len(), 8);
}

#[tokio::test]
async fn test_air_quality_timeout_is_not_fatal() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "weather", ResponseTemplate::new(200).set_body_json(current_response())).await;
    mount(&mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(
        &mock_server,
        "air_pollution",
        ResponseTemplate::new(200)
            .set_body_json(air_response())
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let snapshot = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.unwrap();
    assert!(snapshot.air_quality.is_none());
}

#[tokio::test]
async fn test_current_unauthorized_is_provider_error() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "weather",
        ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
        })),
    )
    .await;
    mount(&mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(&mock_server, "air_pollution", ResponseTemplate::new(200).set_body_json(air_response())).await;

    let result = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await;

    match result {
        Err(WeatherError::Provider(err)) => {
            assert_eq!(err.stage, Stage::Current);
            assert_eq!(err.status, Some(401));
            assert!(!err.transient);
            assert!(!err.message.contains("test-key"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forecast_failure_is_provider_error() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "weather", ResponseTemplate::new(200).set_body_json(current_response())).await;
    mount(&mock_server, "forecast", ResponseTemplate::new(500).set_body_string("upstream down")).await;
    mount(&mock_server, "air_pollution", ResponseTemplate::new(200).set_body_json(air_response())).await;

    let err = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.unwrap_err();
    assert!(matches!(err, WeatherError::Provider(ref e) if e.stage == Stage::Forecast && e.status == Some(500)));
}

#[tokio::test]
async fn test_malformed_current_json_is_provider_error() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "weather", ResponseTemplate::new(200).set_body_string("not json")).await;
    mount(&mock_server, "forecast", ResponseTemplate::new(200).set_body_json(forecast_response())).await;
    mount(&mock_server, "air_pollution", ResponseTemplate::new(200).set_body_json(air_response())).await;

    let err = create_test_client(&mock_server).fetch_weather(51.5, -0.12).await.unwrap_err();
    assert!(matches!(err, WeatherError::Provider(ref e) if e.stage == Stage::Current && e.status.is_none()));
}

#[tokio::test]
async fn test_unreachable_provider_is_transient() {
    let config = ProviderConfig {
        base_url: "http://127.0.0.1:9/data/2.5".into(),
        geo_url: "http://127.0.0.1:9/geo/1.0".into(),
        timeout_secs: 1,
    };
    let client = OpenWeatherProvider::new("test-key".into(), &config).unwrap();

    match client.fetch_weather(0.0, 0.0).await {
        Err(WeatherError::Provider(err)) => {
            assert!(err.transient);
            assert!(!err.message.contains("test-key"));
        }
        other => panic!("expected transient provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_coordinates_make_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = create_test_client(&mock_server).fetch_weather(120.0, 0.0).await.unwrap_err();
    assert!(matches!(err, WeatherError::InvalidCoordinates { .. }));
}

// =============================================================================
// Geocoding
// =============================================================================

#[tokio::test]
async fn test_search_locations_maps_results() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "London"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "London", "local_names": { "en": "London" }, "lat": 51.5073219, "lon": -0.1276474, "country": "GB", "state": "England" },
            { "name": "London", "lat": 42.9832406, "lon": -81.243372, "country": "CA", "state": "Ontario" },
            { "name": "London", "lat": 39.8864493, "lon": -83.4482529, "country": "US" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results = create_test_client(&mock_server).search_locations(" London ").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].state.as_deref(), Some("England"));
    assert_eq!(results[1].country, "CA");
    assert_eq!(results[2].state, None);
    assert_eq!(results[2].lat, 39.8864493);
}

#[tokio::test]
async fn test_blank_search_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(client.search_locations("").await.unwrap().is_empty());
    assert!(client.search_locations("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_geocoding_failure_propagates_from_client() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = create_test_client(&mock_server).search_locations("London").await.unwrap_err();
    assert!(matches!(err, WeatherError::Provider(ref e) if e.stage == Stage::Geocoding));
}
