//! Weather fetch client.
//!
//! One client, three upstream modes picked by configuration:
//! - `Proxy`: one request to this service's proxy endpoint (no credential here)
//! - `WeatherApi`: one request to WeatherAPI `current.json` with bundled air quality
//! - `OpenWeather`: `weather` and `air_pollution` requested concurrently
//!
//! Each call builds a fresh [`DisplayWeather`]; nothing is cached or retried.
//! The direct modes can also look a place up by city name.

use std::{fmt, sync::Arc};

use anyhow::anyhow;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{Config, ProviderKind};
use crate::error::FetchError;
use crate::location::{FixedLocation, LocationProvider, NoLocation};
use crate::models::{
    AirPollutionPayload, ConditionsPayload, Coordinates, DisplayWeather, PayloadUnits,
    RawPollutionReading, WeatherApiResponse,
};

// ---

/// Upstream the client talks to, with whatever it needs to do so.
#[derive(Clone)]
pub enum ProviderMode {
    Proxy { url: String },
    WeatherApi { api_key: String, base_url: String },
    OpenWeather { api_key: String, base_url: String },
}

impl ProviderMode {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderMode::Proxy { .. } => ProviderKind::Proxy,
            ProviderMode::WeatherApi { .. } => ProviderKind::WeatherApi,
            ProviderMode::OpenWeather { .. } => ProviderKind::OpenWeather,
        }
    }

    /// Select the mode named by `DASHBOARD_PROVIDER`. Direct modes need their
    /// credential at startup.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        // ---
        let missing_key = |var: &str| {
            anyhow!(
                "No API key configured for provider '{}'.\nHint: set {var} or use DASHBOARD_PROVIDER=proxy.",
                cfg.dashboard_provider
            )
        };

        let mode = match cfg.dashboard_provider {
            ProviderKind::Proxy => ProviderMode::Proxy {
                url: cfg.dashboard_proxy_url.clone(),
            },
            ProviderKind::WeatherApi => ProviderMode::WeatherApi {
                api_key: cfg
                    .weather_api_key
                    .clone()
                    .ok_or_else(|| missing_key("WEATHER_API_KEY"))?,
                base_url: cfg.weather_api_base_url.clone(),
            },
            ProviderKind::OpenWeather => ProviderMode::OpenWeather {
                api_key: cfg
                    .openweather_api_key
                    .clone()
                    .ok_or_else(|| missing_key("OPENWEATHER_API_KEY"))?,
                base_url: cfg.openweather_base_url.clone(),
            },
        };
        Ok(mode)
    }
}

// Credentials stay out of `{:?}` output.
impl fmt::Debug for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderMode::Proxy { url } => f.debug_struct("Proxy").field("url", url).finish(),
            ProviderMode::WeatherApi { base_url, .. } => f
                .debug_struct("WeatherApi")
                .field("base_url", base_url)
                .finish_non_exhaustive(),
            ProviderMode::OpenWeather { base_url, .. } => f
                .debug_struct("OpenWeather")
                .field("base_url", base_url)
                .finish_non_exhaustive(),
        }
    }
}

/// Fetches and normalizes weather for the dashboard.
#[derive(Debug, Clone)]
pub struct WeatherFetchClient {
    http: Client,
    mode: ProviderMode,
    location: Arc<dyn LocationProvider>,
}

impl WeatherFetchClient {
    pub fn new(mode: ProviderMode, location: Arc<dyn LocationProvider>) -> Self {
        Self {
            http: Client::new(),
            mode,
            location,
        }
    }

    /// Build the client the dashboard panel uses from the loaded config.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        // ---
        let mode = ProviderMode::from_config(cfg)?;
        let location: Arc<dyn LocationProvider> = match cfg.dashboard_location {
            Some(coords) => Arc::new(FixedLocation(coords)),
            None => Arc::new(NoLocation),
        };
        Ok(Self::new(mode, location))
    }

    pub fn mode(&self) -> &ProviderMode {
        &self.mode
    }

    /// Resolve the current position, then fetch for it.
    #[instrument(skip(self), fields(provider = %self.mode.kind()))]
    pub async fn fetch_display_weather(&self) -> Result<DisplayWeather, FetchError> {
        // ---
        let coords = self.location.current_coordinates().await?;
        self.fetch_for(coords).await
    }

    /// Fetch and normalize weather for known coordinates.
    pub async fn fetch_for(&self, coords: Coordinates) -> Result<DisplayWeather, FetchError> {
        // ---
        match &self.mode {
            ProviderMode::Proxy { url } => self.fetch_via_proxy(url, coords).await,
            ProviderMode::WeatherApi { api_key, base_url } => {
                self.fetch_weather_api(api_key, base_url, &coords.as_query()).await
            }
            ProviderMode::OpenWeather { api_key, base_url } => {
                self.fetch_openweather(api_key, base_url, coords).await
            }
        }
    }

    /// Fetch and normalize weather for a place given by name.
    ///
    /// OpenWeather resolves the name in its `weather` call, and the `coord`
    /// it answers with drives the `air_pollution` call. WeatherAPI takes the
    /// name as its `q` parameter. The proxy only accepts coordinates.
    #[instrument(skip(self), fields(provider = %self.mode.kind()))]
    pub async fn fetch_for_city(&self, city: &str) -> Result<DisplayWeather, FetchError> {
        // ---
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        match &self.mode {
            ProviderMode::Proxy { .. } => {
                Err(FetchError::CityLookupUnsupported(ProviderKind::Proxy))
            }
            ProviderMode::WeatherApi { api_key, base_url } => {
                self.fetch_weather_api(api_key, base_url, city).await
            }
            ProviderMode::OpenWeather { api_key, base_url } => {
                self.fetch_openweather_city(api_key, base_url, city).await
            }
        }
    }

    async fn fetch_via_proxy(
        &self,
        url: &str,
        coords: Coordinates,
    ) -> Result<DisplayWeather, FetchError> {
        // ---
        debug!("Fetching weather via proxy: {}", url);

        let request = self.http.get(url).query(&[
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ]);
        let body = self.send(request, "proxy").await?;

        let mut payload: ConditionsPayload = serde_json::from_str(&body)?;
        let pollution = payload.take_air_quality()?;
        payload.into_display(PayloadUnits::Dashboard, pollution, Utc::now())
    }

    /// `q` is either `lat,lon` or a place name.
    async fn fetch_weather_api(
        &self,
        api_key: &str,
        base_url: &str,
        q: &str,
    ) -> Result<DisplayWeather, FetchError> {
        // ---
        let url = format!("{}/current.json", base_url.trim_end_matches('/'));
        debug!("Fetching weather from WeatherAPI: {}?q={}", url, q);

        let request = self
            .http
            .get(&url)
            .query(&[("key", api_key), ("q", q), ("aqi", "yes")]);
        let body = self.send(request, "WeatherAPI current").await?;

        let value: Value = serde_json::from_str(&body)?;
        for field in ["location", "current"] {
            if value.get(field).map_or(true, Value::is_null) {
                return Err(FetchError::incomplete(field));
            }
        }
        let upstream: WeatherApiResponse = serde_json::from_value(value)?;

        let mut payload = upstream.reshape();
        let pollution = payload.take_air_quality()?;
        payload.into_display(PayloadUnits::Dashboard, pollution, Utc::now())
    }

    async fn fetch_openweather(
        &self,
        api_key: &str,
        base_url: &str,
        coords: Coordinates,
    ) -> Result<DisplayWeather, FetchError> {
        // ---
        let base_url = base_url.trim_end_matches('/');
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();
        debug!("Fetching weather and air pollution from OpenWeather: {}", base_url);

        let conditions = self.http.get(format!("{base_url}/weather")).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", api_key),
            ("units", "metric"),
        ]);
        let pollution = self.air_pollution_request(api_key, base_url, coords);

        // Both must succeed; order between them does not matter.
        let (conditions, pollution) = tokio::try_join!(
            self.send(conditions, "OpenWeather weather"),
            self.send(pollution, "OpenWeather air_pollution"),
        )?;

        let payload: ConditionsPayload = serde_json::from_str(&conditions)?;
        let pollution = read_air_pollution(&pollution)?;

        payload.into_display(PayloadUnits::Metric, pollution, Utc::now())
    }

    /// By name the two calls are sequential: pollution needs the resolved
    /// position. A failed pollution call fails the fetch.
    async fn fetch_openweather_city(
        &self,
        api_key: &str,
        base_url: &str,
        city: &str,
    ) -> Result<DisplayWeather, FetchError> {
        // ---
        let base_url = base_url.trim_end_matches('/');
        debug!("Fetching weather for '{}' from OpenWeather: {}", city, base_url);

        let conditions = self.http.get(format!("{base_url}/weather")).query(&[
            ("q", city),
            ("appid", api_key),
            ("units", "metric"),
        ]);
        let conditions = self.send(conditions, "OpenWeather weather").await?;
        let payload: ConditionsPayload = serde_json::from_str(&conditions)?;
        let coords = payload.coordinates()?;

        let pollution = self.air_pollution_request(api_key, base_url, coords);
        let pollution = self.send(pollution, "OpenWeather air_pollution").await?;
        let pollution = read_air_pollution(&pollution)?;

        payload.into_display(PayloadUnits::Metric, pollution, Utc::now())
    }

    fn air_pollution_request(
        &self,
        api_key: &str,
        base_url: &str,
        coords: Coordinates,
    ) -> RequestBuilder {
        self.http.get(format!("{base_url}/air_pollution")).query(&[
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("appid", api_key.to_string()),
        ])
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String, FetchError> {
        // ---
        let res = request.send().await.map_err(reqwest::Error::without_url)?;
        let status = res.status();
        let body = res.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            debug!("{} request failed with status {}", what, status);
            return Err(FetchError::UpstreamRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        debug!("{} request succeeded ({} bytes)", what, body.len());
        Ok(body)
    }
}

fn read_air_pollution(body: &str) -> Result<RawPollutionReading, FetchError> {
    let payload: AirPollutionPayload = serde_json::from_str(body)?;
    RawPollutionReading::from_air_pollution(payload)
}
