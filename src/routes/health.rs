// src/routes/health.rs
//! Liveness endpoint for the weather service.
//!
//! `GET /health` answers without touching the upstream provider. It also
//! says whether the proxy credential is present, since a missing key is the
//! one configuration fault the proxy only reports per request.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    proxy_configured: bool,
}

/// Handle `GET /health`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        proxy_configured: state.config.weather_api_key.is_some(),
    })
}

/// Subrouter with the single GET `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
