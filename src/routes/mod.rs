use std::sync::Arc;

use axum::Router;

use crate::{Config, WeatherPanel};

mod display;
mod health;
mod weather_proxy;

// ---

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub panel: Arc<WeatherPanel>,
}

pub fn router(config: Config, panel: Arc<WeatherPanel>) -> Router {
    // ---
    let proxy_path = config.proxy_path.clone();
    let state = AppState {
        config,
        http: reqwest::Client::new(),
        panel,
    };

    Router::new()
        .merge(weather_proxy::router(&proxy_path))
        .merge(display::router())
        .merge(health::router())
        .with_state(state)
}
