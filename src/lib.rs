//! Weather and air-quality service for the nature dashboard.
//!
//! The crate holds the pipeline that turns provider measurements into the
//! dashboard's display record:
//! - `units` and `aqi`: pure conversion and classification
//! - `client`: fetches from the proxy, WeatherAPI or OpenWeather and normalizes
//! - `panel`: displayed state, guarded against stale refreshes
//! - `routes`: the credential-holding weather proxy and its sibling routes
//!
//! `main.rs` wires these together (EMBP: each module is reached through this
//! gateway, never by path from a sibling's internals).

pub mod aqi;
pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod models;
pub mod panel;
pub mod routes;
pub mod units;

pub use aqi::{AirQualityIndex, AqiLabel, AqiScale};
pub use client::{ProviderMode, WeatherFetchClient};
pub use config::{Config, ProviderKind};
pub use error::{FetchError, ProxyError};
pub use location::{FixedLocation, LocationProvider, NoLocation};
pub use models::{AirQuality, Coordinates, DisplayWeather, RawPollutionReading};
pub use panel::{PanelSnapshot, WeatherPanel};
