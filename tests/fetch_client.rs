//! Fetch client behaviour against mocked upstream providers.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use nature_dashboard::{
    AirQualityIndex, AqiLabel, Coordinates, FetchError, FixedLocation, ProviderMode,
    WeatherFetchClient, WeatherPanel,
};

fn client(mode: ProviderMode) -> WeatherFetchClient {
    let coords = Coordinates::new(52.52, 13.41).unwrap();
    WeatherFetchClient::new(mode, Arc::new(FixedLocation(coords)))
}

fn openweather_conditions() -> Value {
    json!({
        "coord": { "lon": 13.41, "lat": 52.52 },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "main": { "temp": 11.2, "feels_like": 10.1, "pressure": 1008, "humidity": 87 },
        "visibility": 8000,
        "wind": { "speed": 4.1, "deg": 210 },
        "name": "Berlin"
    })
}

fn openweather_pollution(aqi: u8) -> Value {
    json!({
        "coord": { "lon": 13.41, "lat": 52.52 },
        "list": [{
            "main": { "aqi": aqi },
            "components": { "co": 233.6, "no": 0.0, "no2": 14.2, "o3": 61.5,
                            "so2": 2.1, "pm2_5": 12.3, "pm10": 17.8, "nh3": 0.9 },
            "dt": 1717230000
        }]
    })
}

fn proxy_body() -> Value {
    json!({
        "main": { "temp": 24.0, "feels_like": 25.1, "humidity": 55, "pressure": 1015.0 },
        "weather": [{ "main": "Sunny", "description": "Sunny", "icon": "//cdn.weatherapi.com/113.png" }],
        "wind": { "speed": 9.0, "deg": 90.0 },
        "visibility": 10.0,
        "name": "Madrid",
        "air_quality": { "co": 210.0, "pm2_5": 30.1, "us-epa-index": 3, "gb-defra-index": 4 }
    })
}

async fn mount_openweather(
    server: &MockServer,
    conditions: ResponseTemplate,
    pollution: ResponseTemplate,
) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("appid", "ow-key"))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.41"))
        .respond_with(conditions)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/air_pollution"))
        .and(query_param("appid", "ow-key"))
        .respond_with(pollution)
        .mount(server)
        .await;
}

fn openweather_mode(server: &MockServer) -> ProviderMode {
    ProviderMode::OpenWeather {
        api_key: "ow-key".to_string(),
        base_url: server.uri(),
    }
}

#[tokio::test]
async fn openweather_converts_units_and_uses_five_band_scale() {
    // ---
    let server = MockServer::start().await;
    mount_openweather(
        &server,
        ResponseTemplate::new(200).set_body_json(openweather_conditions()),
        ResponseTemplate::new(200).set_body_json(openweather_pollution(3)),
    )
    .await;

    let weather = assert_ok!(client(openweather_mode(&server)).fetch_display_weather().await);

    assert_eq!(weather.temperature_c, 11.2);
    assert_eq!(weather.condition, "Rain");
    assert_eq!(weather.humidity_pct, 87);
    assert!((weather.wind_speed_kmh - 14.76).abs() < 1e-9);
    assert_eq!(weather.visibility_km, 8.0);
    assert_eq!(weather.location_name.as_deref(), Some("Berlin"));
    assert_eq!(weather.air_quality.index(), AirQualityIndex::ordinal5(3));
    assert_eq!(weather.air_quality.label(), AqiLabel::Moderate);
}

#[tokio::test]
async fn openweather_fails_when_pollution_request_fails() {
    // ---
    let server = MockServer::start().await;
    mount_openweather(
        &server,
        ResponseTemplate::new(200).set_body_json(openweather_conditions()),
        ResponseTemplate::new(500).set_body_string("upstream exploded"),
    )
    .await;

    let err = assert_err!(client(openweather_mode(&server)).fetch_display_weather().await);
    match err {
        FetchError::UpstreamRequestFailed { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected upstream failure, got {other:?}"),
    }
}

#[tokio::test]
async fn openweather_missing_wind_is_incomplete() {
    // ---
    let mut conditions = openweather_conditions();
    conditions.as_object_mut().unwrap().remove("wind");

    let server = MockServer::start().await;
    mount_openweather(
        &server,
        ResponseTemplate::new(200).set_body_json(conditions),
        ResponseTemplate::new(200).set_body_json(openweather_pollution(1)),
    )
    .await;

    let err = assert_err!(client(openweather_mode(&server)).fetch_display_weather().await);
    assert!(matches!(err, FetchError::UpstreamPayloadIncomplete(f) if f == "wind"));
}

#[tokio::test]
async fn weatherapi_direct_uses_epa_scale() {
    // ---
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("key", "wa-key"))
        .and(query_param("q", "52.52,13.41"))
        .and(query_param("aqi", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": { "name": "Berlin" },
            "current": {
                "temp_c": 9.0, "feelslike_c": 7.0, "humidity": 70, "pressure_mb": 1011.0,
                "condition": { "text": "Overcast", "icon": "//cdn.weatherapi.com/122.png" },
                "wind_kph": 22.3, "wind_degree": 300, "vis_km": 6.0,
                "air_quality": { "pm2_5": 41.0, "us-epa-index": 4 }
            }
        })))
        .mount(&server)
        .await;

    let mode = ProviderMode::WeatherApi {
        api_key: "wa-key".to_string(),
        base_url: server.uri(),
    };
    let weather = assert_ok!(client(mode).fetch_display_weather().await);

    assert_eq!(weather.wind_speed_kmh, 22.3);
    assert_eq!(weather.visibility_km, 6.0);
    assert_eq!(weather.feels_like_c, Some(7.0));
    assert_eq!(weather.air_quality.label(), AqiLabel::Unhealthy);
}

#[tokio::test]
async fn weatherapi_direct_missing_current_is_incomplete() {
    // ---
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "location": { "name": "Berlin" } })),
        )
        .mount(&server)
        .await;

    let mode = ProviderMode::WeatherApi {
        api_key: "wa-key".to_string(),
        base_url: server.uri(),
    };
    let err = assert_err!(client(mode).fetch_display_weather().await);
    assert!(matches!(err, FetchError::UpstreamPayloadIncomplete(f) if f == "current"));
}

#[tokio::test]
async fn proxy_mode_normalizes_bundled_air_quality() {
    // ---
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(proxy_body()))
        .mount(&server)
        .await;

    let mode = ProviderMode::Proxy {
        url: format!("{}/api/weather", server.uri()),
    };
    let weather = assert_ok!(client(mode).fetch_display_weather().await);

    assert_eq!(weather.wind_speed_kmh, 9.0);
    assert_eq!(weather.air_quality.index(), AirQualityIndex::epa6(3));
    assert_eq!(
        weather.air_quality.label(),
        AqiLabel::UnhealthyForSensitiveGroups
    );
    assert_eq!(weather.air_quality.uk_defra_index(), Some(4));
}

#[tokio::test]
async fn proxy_mode_missing_wind_is_incomplete() {
    // ---
    let mut body = proxy_body();
    body.as_object_mut().unwrap().remove("wind");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let mode = ProviderMode::Proxy {
        url: format!("{}/api/weather", server.uri()),
    };
    let err = assert_err!(client(mode).fetch_display_weather().await);
    assert!(matches!(err, FetchError::UpstreamPayloadIncomplete(f) if f == "wind"));
}

#[tokio::test]
async fn proxy_mode_missing_air_quality_is_incomplete() {
    // ---
    let mut body = proxy_body();
    body.as_object_mut().unwrap().remove("air_quality");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let mode = ProviderMode::Proxy {
        url: format!("{}/api/weather", server.uri()),
    };
    let err = assert_err!(client(mode).fetch_display_weather().await);
    assert!(matches!(err, FetchError::UpstreamPayloadIncomplete(f) if f == "air_quality"));
}

#[tokio::test]
async fn proxy_error_status_is_reported() {
    // ---
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Weather API request failed",
            "details": { "error": { "code": 9999 } }
        })))
        .mount(&server)
        .await;

    let mode = ProviderMode::Proxy {
        url: format!("{}/api/weather", server.uri()),
    };
    let err = assert_err!(client(mode).fetch_display_weather().await);
    assert!(matches!(err, FetchError::UpstreamRequestFailed { status: 503, .. }));
}

#[tokio::test]
async fn openweather_city_lookup_uses_resolved_position() {
    // ---
    let mut conditions = openweather_conditions();
    conditions["name"] = json!("London");
    conditions["coord"] = json!({ "lon": -0.13, "lat": 51.51 });

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", "ow-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conditions))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/air_pollution"))
        .and(query_param("lat", "51.51"))
        .and(query_param("lon", "-0.13"))
        .and(query_param("appid", "ow-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openweather_pollution(2)))
        .expect(1)
        .mount(&server)
        .await;

    let weather = assert_ok!(client(openweather_mode(&server)).fetch_for_city(" London ").await);

    assert_eq!(weather.location_name.as_deref(), Some("London"));
    assert_eq!(weather.visibility_km, 8.0);
    assert_eq!(weather.air_quality.index(), AirQualityIndex::ordinal5(2));
    assert_eq!(weather.air_quality.label(), AqiLabel::Fair);
}

#[tokio::test]
async fn openweather_city_lookup_fails_when_pollution_fails() {
    // ---
    let mut conditions = openweather_conditions();
    conditions["coord"] = json!({ "lon": -0.13, "lat": 51.51 });

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conditions))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/air_pollution"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = assert_err!(client(openweather_mode(&server)).fetch_for_city("London").await);
    assert!(matches!(err, FetchError::UpstreamRequestFailed { status: 502, .. }));
}

#[tokio::test]
async fn openweather_city_lookup_without_coord_is_incomplete() {
    // ---
    let mut conditions = openweather_conditions();
    conditions.as_object_mut().unwrap().remove("coord");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conditions))
        .mount(&server)
        .await;

    let err = assert_err!(client(openweather_mode(&server)).fetch_for_city("Berlin").await);
    assert!(matches!(err, FetchError::UpstreamPayloadIncomplete(f) if f == "coord"));
}

#[tokio::test]
async fn weatherapi_city_lookup_sends_name_as_query() {
    // ---
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("key", "wa-key"))
        .and(query_param("q", "Porto"))
        .and(query_param("aqi", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": { "name": "Porto" },
            "current": {
                "temp_c": 17.0, "feelslike_c": 17.0, "humidity": 72, "pressure_mb": 1019.0,
                "condition": { "text": "Clear", "icon": "//cdn.weatherapi.com/113.png" },
                "wind_kph": 12.0, "wind_degree": 320, "vis_km": 10.0,
                "air_quality": { "pm2_5": 4.0, "us-epa-index": 1 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mode = ProviderMode::WeatherApi {
        api_key: "wa-key".to_string(),
        base_url: server.uri(),
    };
    let weather = assert_ok!(client(mode).fetch_for_city("Porto").await);
    assert_eq!(weather.location_name.as_deref(), Some("Porto"));
    assert_eq!(weather.air_quality.label(), AqiLabel::Good);
}

#[tokio::test]
async fn unreachable_provider_error_on_panel_hides_key() {
    // ---
    let mode = ProviderMode::OpenWeather {
        api_key: "OW-SECRET".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
    };
    let panel = WeatherPanel::new();
    assert!(panel.refresh(&client(mode)).await);

    let error = panel.snapshot().error.unwrap_or_default();
    assert!(error.starts_with("HTTP request failed"), "got {error}");
    assert!(!error.contains("OW-SECRET"), "credential leaked: {error}");
}
