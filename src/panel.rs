//! Dashboard weather panel state.
//!
//! Refreshes are started by a timer and may overlap. Each refresh takes a
//! sequence number when it starts; its result is applied only if it is newer
//! than the one on display, so a slow response can never overwrite a newer
//! one. Results still in flight behind a newer start are applied when they
//! land, so an upstream slower than the refresh interval still updates the
//! panel.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::WeatherFetchClient;
use crate::error::FetchError;
use crate::models::DisplayWeather;

// ---

/// What the panel currently shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelSnapshot {
    /// Sequence number of the refresh that produced this state (0 = none yet).
    pub sequence: u64,
    pub weather: Option<DisplayWeather>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct WeatherPanel {
    issued: AtomicU64,
    state: Mutex<PanelSnapshot>,
}

impl WeatherPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh and return its sequence number.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest sequence number handed out.
    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Apply the outcome of refresh `seq`. Returns `false` and leaves the
    /// state alone when a newer refresh has already been applied.
    ///
    /// A failed fetch keeps the previous weather and records the error.
    pub fn apply(&self, seq: u64, outcome: Result<DisplayWeather, FetchError>) -> bool {
        // ---
        let mut state = self.state.lock();

        if seq <= state.sequence {
            debug!(
                "Discarding stale weather refresh {} (showing {}, latest issued {})",
                seq,
                state.sequence,
                self.latest_issued()
            );
            return false;
        }

        state.sequence = seq;
        match outcome {
            Ok(weather) => {
                info!("Weather refresh {}: {}", seq, weather);
                state.weather = Some(weather);
                state.error = None;
            }
            Err(e) => {
                warn!("Weather refresh {} failed: {}", seq, e);
                state.error = Some(e.to_string());
            }
        }
        true
    }

    /// Fetch through `client` and apply the result if still current.
    pub async fn refresh(&self, client: &WeatherFetchClient) -> bool {
        // ---
        let seq = self.begin();
        let outcome = client.fetch_display_weather().await;
        self.apply(seq, outcome)
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        self.state.lock().clone()
    }
}
