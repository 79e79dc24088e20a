//! Configuration loader for the `nature-dashboard` weather service.
//!
//! Every runtime setting and its default lives here. Values come from the
//! process environment (the binary reads `.env` first) or, in tests, from any
//! lookup closure passed to [`load_from`].
use std::{env, fmt, str::FromStr};

use anyhow::{anyhow, Result};

use crate::models::Coordinates;

/// Parse an optional environment variable into `$ty`, with a default value.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional environment variable into `Option<$ty>`.
macro_rules! parse_optional_env {
    ($lookup:expr, $var_name:expr, $ty:ty) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
    };
}

/// Read an optional string variable; blank counts as unset.
macro_rules! optional_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
}

pub const DEFAULT_WEATHER_API_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_PROXY_PATH: &str = "/api/weather";

/// Which upstream the dashboard panel reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Through this service's own proxy endpoint.
    Proxy,
    /// WeatherAPI directly, credential held by the client.
    WeatherApi,
    /// OpenWeather `weather` + `air_pollution`, credential held by the client.
    OpenWeather,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Proxy => "proxy",
            ProviderKind::WeatherApi => "weatherapi",
            ProviderKind::OpenWeather => "openweather",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "proxy" => Ok(ProviderKind::Proxy),
            "weatherapi" => Ok(ProviderKind::WeatherApi),
            "openweather" => Ok(ProviderKind::OpenWeather),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: proxy, weatherapi, openweather."
            )),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Clone)]
pub struct Config {
    // ---
    /// Port the HTTP server binds on all interfaces.
    pub listen_port: u16,

    /// Route of the weather proxy endpoint.
    pub proxy_path: String,

    /// WeatherAPI credential held by the proxy. Checked per request.
    pub weather_api_key: Option<String>,

    /// WeatherAPI base URL used by the proxy and by `weatherapi` mode.
    pub weather_api_base_url: String,

    /// Provider the dashboard panel reads from.
    pub dashboard_provider: ProviderKind,

    /// Full URL of the proxy endpoint for `proxy` mode.
    pub dashboard_proxy_url: String,

    /// OpenWeather credential for `openweather` mode.
    pub openweather_api_key: Option<String>,

    /// OpenWeather base URL.
    pub openweather_base_url: String,

    /// Dashboard position; `None` means no location capability.
    pub dashboard_location: Option<Coordinates>,

    /// Seconds between panel refreshes; `0` disables the poller.
    pub poll_interval_secs: u64,
}

// Credentials stay out of `{:?}` output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_port", &self.listen_port)
            .field("proxy_path", &self.proxy_path)
            .field("weather_api_key", &mask(&self.weather_api_key))
            .field("weather_api_base_url", &self.weather_api_base_url)
            .field("dashboard_provider", &self.dashboard_provider)
            .field("dashboard_proxy_url", &self.dashboard_proxy_url)
            .field("openweather_api_key", &mask(&self.openweather_api_key))
            .field("openweather_base_url", &self.openweather_base_url)
            .field("dashboard_location", &self.dashboard_location)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `PROXY_PATH` – proxy route (default: `/api/weather`)
/// - `WEATHER_API_KEY` – WeatherAPI credential for the proxy
/// - `WEATHER_API_BASE_URL` – WeatherAPI base URL
/// - `DASHBOARD_PROVIDER` – `proxy`, `weatherapi` or `openweather` (default: `proxy`)
/// - `DASHBOARD_PROXY_URL` – proxy URL for `proxy` mode (default: this server)
/// - `OPENWEATHER_API_KEY`, `OPENWEATHER_BASE_URL`
/// - `DASHBOARD_LAT`, `DASHBOARD_LON` – dashboard position, both or neither
/// - `DASHBOARD_POLL_SECS` – refresh interval (default: 60, 0 disables)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let listen_port = parse_env!(lookup, "LISTEN_PORT", u16, 8080);
    let proxy_path =
        optional_env!(lookup, "PROXY_PATH").unwrap_or_else(|| DEFAULT_PROXY_PATH.to_string());
    validate_proxy_path(&proxy_path)?;

    let weather_api_key = optional_env!(lookup, "WEATHER_API_KEY");
    let weather_api_base_url = optional_env!(lookup, "WEATHER_API_BASE_URL")
        .unwrap_or_else(|| DEFAULT_WEATHER_API_BASE_URL.to_string());

    let dashboard_provider =
        parse_env!(lookup, "DASHBOARD_PROVIDER", ProviderKind, ProviderKind::Proxy);
    let dashboard_proxy_url = optional_env!(lookup, "DASHBOARD_PROXY_URL")
        .unwrap_or_else(|| format!("http://127.0.0.1:{listen_port}{proxy_path}"));

    let openweather_api_key = optional_env!(lookup, "OPENWEATHER_API_KEY");
    let openweather_base_url = optional_env!(lookup, "OPENWEATHER_BASE_URL")
        .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.to_string());

    let lat = parse_optional_env!(lookup, "DASHBOARD_LAT", f64);
    let lon = parse_optional_env!(lookup, "DASHBOARD_LON", f64);
    let dashboard_location = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(
            Coordinates::new(lat, lon)
                .map_err(|e| anyhow!("Invalid DASHBOARD_LAT/DASHBOARD_LON: {}", e))?,
        ),
        (None, None) => None,
        _ => return Err(anyhow!("DASHBOARD_LAT and DASHBOARD_LON must be set together")),
    };

    let poll_interval_secs = parse_env!(lookup, "DASHBOARD_POLL_SECS", u64, 60);

    Ok(Config {
        listen_port,
        proxy_path,
        weather_api_key,
        weather_api_base_url,
        dashboard_provider,
        dashboard_proxy_url,
        openweather_api_key,
        openweather_base_url,
        dashboard_location,
        poll_interval_secs,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Credentials are masked; only whether they are set is shown.
    pub fn log_config(&self) {
        // ---
        let location = match self.dashboard_location {
            Some(c) => format!("{}, {}", c.latitude, c.longitude),
            None => "<unset>".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  LISTEN_PORT          : {}", self.listen_port);
        tracing::info!("  PROXY_PATH           : {}", self.proxy_path);
        tracing::info!("  WEATHER_API_KEY      : {}", mask(&self.weather_api_key));
        tracing::info!("  WEATHER_API_BASE_URL : {}", self.weather_api_base_url);
        tracing::info!("  DASHBOARD_PROVIDER   : {}", self.dashboard_provider);
        tracing::info!("  DASHBOARD_PROXY_URL  : {}", self.dashboard_proxy_url);
        tracing::info!("  OPENWEATHER_API_KEY  : {}", mask(&self.openweather_api_key));
        tracing::info!("  OPENWEATHER_BASE_URL : {}", self.openweather_base_url);
        tracing::info!("  DASHBOARD_LOCATION   : {}", location);
        tracing::info!("  DASHBOARD_POLL_SECS  : {}", self.poll_interval_secs);

        if self.weather_api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY is not set; the proxy will answer 500 until it is");
        }
    }
}

/// Routes the proxy path must not shadow.
const RESERVED_PATHS: [&str; 2] = ["/health", "/display"];

/// The proxy path is a literal route: no captures or wildcards, and not one
/// of the sibling routes.
fn validate_proxy_path(path: &str) -> Result<()> {
    // ---
    if !path.starts_with('/') {
        return Err(anyhow!("Invalid PROXY_PATH: must start with '/'"));
    }
    if path.contains(['{', '}', '*', '?', '#', ':']) {
        return Err(anyhow!(
            "Invalid PROXY_PATH '{path}': only literal path segments are allowed"
        ));
    }
    if path.contains("//") {
        return Err(anyhow!("Invalid PROXY_PATH '{path}': empty path segment"));
    }
    if RESERVED_PATHS.contains(&path.trim_end_matches('/')) {
        return Err(anyhow!("Invalid PROXY_PATH '{path}': route is already in use"));
    }
    Ok(())
}

fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "****",
        None => "<unset>",
    }
}
