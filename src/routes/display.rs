//! `GET /display`: what the weather panel currently shows.

use axum::{extract::State, routing::get, Json, Router};

use super::AppState;
use crate::PanelSnapshot;

pub fn router() -> Router<AppState> {
    Router::new().route("/display", get(handler))
}

async fn handler(State(state): State<AppState>) -> Json<PanelSnapshot> {
    Json(state.panel.snapshot())
}
