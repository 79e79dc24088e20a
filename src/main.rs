//! Application entry point for the `nature-dashboard` weather service.
//!
//! This binary orchestrates the startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the dashboard fetch client for the configured provider
//! - Starting the panel poller when a refresh interval is set
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `WEATHER_API_KEY` – upstream credential held by the proxy
//! - `DASHBOARD_PROVIDER` – `proxy` (default), `weatherapi` or `openweather`
//! - `DASHBOARD_LAT` / `DASHBOARD_LON` – dashboard position
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the full list.
use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use nature_dashboard::{config, routes, WeatherFetchClient, WeatherPanel};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let client = WeatherFetchClient::from_config(&cfg)?;
    tracing::info!("Dashboard fetch client: {:?}", client.mode());

    let panel = Arc::new(WeatherPanel::new());
    if cfg.poll_interval_secs > 0 {
        spawn_poller(client, panel.clone(), cfg.poll_interval_secs);
    } else {
        tracing::info!("DASHBOARD_POLL_SECS is 0, panel poller disabled");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(cfg, panel);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Refresh the panel on a fixed interval.
///
/// Every tick starts its own refresh task, so a slow upstream can leave
/// refreshes overlapping; the panel's sequence numbers decide which result
/// is shown. The first tick fires immediately.
fn spawn_poller(client: WeatherFetchClient, panel: Arc<WeatherPanel>, every_secs: u64) {
    // ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs));
        loop {
            ticker.tick().await;
            let client = client.clone();
            let panel = panel.clone();
            tokio::spawn(async move {
                panel.refresh(&client).await;
            });
        }
    });
}

/// Install the global subscriber for the service's log output.
///
/// `RUST_LOG` wins when set. Otherwise `AXUM_LOG_LEVEL` picks the level
/// (default `debug`) for this crate's fetch, panel and proxy logs.
/// `hyper_util` stays at `warn` and `reqwest` at `info` under that filter.
///
/// `AXUM_SPAN_EVENTS=full|enter_exit` adds span enter/exit events, which
/// shows timing of the instrumented `fetch_display_weather` and
/// `fetch_for_city` spans; the default reports span close only. Colour follows
/// `FORCE_COLOR` (`1`/`true`/`yes`, `0`/`false`/`no`) and otherwise whether
/// stdout is a terminal.
///
/// Runs once, after `.env` is loaded so its values apply.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = env::var("AXUM_LOG_LEVEL")
            .ok()
            .filter(|l| matches!(l.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
            .unwrap_or_else(|| "debug".to_string());
        EnvFilter::new(format!("{level},hyper_util=warn,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
