// src/routes/weather_proxy.rs
//! Weather proxy endpoint.
//!
//! `GET <PROXY_PATH>?lat=&lon=` forwards the coordinates to WeatherAPI
//! `current.json` with the server-side key and returns the response
//! reshaped into the dashboard's conditions layout. The key never leaves this
//! process. Only GET (and HEAD) are routed; anything else gets `405`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::AppState;
use crate::error::{truncate_body, ProxyError};
use crate::models::{ConditionsPayload, Coordinates, WeatherApiResponse};

// ---

pub fn router(path: &str) -> Router<AppState> {
    // ---
    Router::new().route(path, get(handler).fallback(method_not_allowed))
}

/// Raw query; both values are optional here so absence becomes our own 400.
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    lat: Option<String>,
    lon: Option<String>,
}

async fn handler(
    query: Result<Query<ProxyQuery>, QueryRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ProxyError> {
    // ---
    info!("GET {}", state.config.proxy_path);

    // Checked per request, before the parameters.
    let api_key = state.config.weather_api_key.as_deref().ok_or_else(|| {
        error!("Weather API key is not defined in environment variables");
        ProxyError::Configuration
    })?;

    let Query(params) = query.map_err(|e| {
        debug!("Rejected query string: {}", e.body_text());
        ProxyError::Validation(format!("Invalid parameters: {}", e.body_text()))
    })?;
    debug!("GET {} - {:?}", state.config.proxy_path, params);
    let coords = parse_coordinates(&params)?;

    let shaped = fetch_current(
        &state.http,
        &state.config.weather_api_base_url,
        api_key,
        coords,
    )
    .await?;

    debug!("GET {} - Returning OK", state.config.proxy_path);
    Ok(([(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json(shaped)))
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

fn parse_coordinates(params: &ProxyQuery) -> Result<Coordinates, ProxyError> {
    // ---
    let (Some(lat), Some(lon)) = (params.lat.as_deref(), params.lon.as_deref()) else {
        return Err(ProxyError::Validation(
            "Missing required parameters: lat and lon".to_string(),
        ));
    };

    let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) else {
        return Err(ProxyError::Validation(
            "Invalid parameters: lat and lon must be numbers".to_string(),
        ));
    };

    Coordinates::new(lat, lon).map_err(|e| ProxyError::Validation(e.to_string()))
}

/// Call WeatherAPI `current.json` with air quality and reshape the answer.
async fn fetch_current(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    coords: Coordinates,
) -> Result<ConditionsPayload, ProxyError> {
    // ---
    let url = format!("{}/current.json", base_url.trim_end_matches('/'));
    let q = coords.as_query();
    debug!("Fetching weather data from: {}?q={}&aqi=yes", url, q);

    let res = http
        .get(&url)
        .query(&[("key", api_key), ("q", q.as_str()), ("aqi", "yes")])
        .send()
        .await
        .map_err(transport)?;

    let status = res.status();
    let body = res.text().await.map_err(transport)?;

    if !status.is_success() {
        error!("Weather API error: {} {}", status, truncate_body(&body));
        let details = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        return Err(ProxyError::Upstream { status, details });
    }

    let upstream: WeatherApiResponse = serde_json::from_str(&body).map_err(internal)?;
    Ok(upstream.reshape())
}

/// The request URL carries the key, so it is stripped before the error is
/// logged or returned.
fn transport(e: reqwest::Error) -> ProxyError {
    internal(e.without_url())
}

/// Transport failures and undecodable upstream bodies.
fn internal(e: impl std::fmt::Display) -> ProxyError {
    error!("Error fetching weather data: {}", e);
    ProxyError::Internal(e.to_string())
}
