//! Data models for the weather pipeline.
//!
//! Three groups live here:
//! - wire shapes read from (or written to) HTTP: the conditions payload that
//!   both OpenWeather and the proxy speak, the WeatherAPI `current.json`
//!   response, and the two air-pollution shapes
//! - [`RawPollutionReading`], which keeps the two pollution shapes apart
//! - [`DisplayWeather`], the normalized record the dashboard renders

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aqi::{AirQualityIndex, AqiLabel};
use crate::error::FetchError;
use crate::units::{meters_to_km, ms_to_kmh};

// ---

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FetchError> {
        // ---
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(FetchError::InvalidCoordinates);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// `lat,lon` as WeatherAPI expects in its `q` parameter.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// `main` block of a conditions payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    pub humidity: f64,
    #[serde(default)]
    pub pressure: Option<f64>,
}

/// One entry of the `weather` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionBlock {
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindBlock {
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

/// `coord` block OpenWeather echoes back, used after a lookup by city name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordBlock {
    pub lat: f64,
    pub lon: f64,
}

/// Current-conditions payload in the OpenWeather layout.
///
/// OpenWeather returns this with wind in m/s and visibility in meters; the
/// proxy returns the same layout with km/h and km plus a bundled
/// `air_quality` object. Every block is optional on the wire so a missing
/// block is reported instead of being defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionsPayload {
    pub main: Option<MainBlock>,
    pub weather: Option<Vec<ConditionBlock>>,
    pub wind: Option<WindBlock>,
    pub visibility: Option<f64>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<CoordBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<Value>,
}

/// Units the wind and visibility fields of a [`ConditionsPayload`] are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadUnits {
    /// m/s and meters (OpenWeather `units=metric`).
    Metric,
    /// km/h and km (WeatherAPI, and therefore the proxy).
    Dashboard,
}

/// WeatherAPI `current.json` response, only the fields we reshape.
#[derive(Debug, Deserialize)]
pub struct WeatherApiResponse {
    pub location: WeatherApiLocation,
    pub current: WeatherApiCurrent,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiLocation {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiCondition {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiCurrent {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: f64,
    pub pressure_mb: f64,
    pub condition: WeatherApiCondition,
    pub wind_kph: f64,
    pub wind_degree: f64,
    pub vis_km: f64,
    #[serde(default)]
    pub air_quality: Option<Value>,
}

impl WeatherApiResponse {
    /// Reshape into the conditions layout. `air_quality` is moved across
    /// untouched.
    pub fn reshape(self) -> ConditionsPayload {
        // ---
        let current = self.current;
        ConditionsPayload {
            main: Some(MainBlock {
                temp: current.temp_c,
                feels_like: Some(current.feelslike_c),
                humidity: current.humidity,
                pressure: Some(current.pressure_mb),
            }),
            weather: Some(vec![ConditionBlock {
                main: current.condition.text.clone(),
                description: current.condition.text,
                icon: Some(current.condition.icon),
            }]),
            wind: Some(WindBlock {
                speed: current.wind_kph,
                deg: Some(current.wind_degree),
            }),
            visibility: Some(current.vis_km),
            name: Some(self.location.name),
            coord: None,
            air_quality: current.air_quality,
        }
    }
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

/// WeatherAPI `air_quality` object.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherApiAirQuality {
    #[serde(flatten)]
    pub pollutants: Pollutants,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: Option<u8>,
    #[serde(rename = "gb-defra-index")]
    pub gb_defra_index: Option<u8>,
}

/// OpenWeather `air_pollution` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AirPollutionPayload {
    pub list: Option<Vec<AirPollutionEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirPollutionEntry {
    pub main: Option<AirPollutionMain>,
    #[serde(default)]
    pub components: Option<Pollutants>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirPollutionMain {
    pub aqi: u8,
}

/// Air-pollution reading as a provider delivered it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPollutionReading {
    /// Single 1–5 index with optional concentrations.
    Ordinal {
        aqi: u8,
        components: Option<Pollutants>,
    },
    /// Concentrations plus precomputed regional indices.
    Composite {
        pollutants: Pollutants,
        us_epa_index: Option<u8>,
        uk_defra_index: Option<u8>,
    },
}

impl RawPollutionReading {
    /// Take the first entry of an OpenWeather `air_pollution` response.
    pub fn from_air_pollution(payload: AirPollutionPayload) -> Result<Self, FetchError> {
        // ---
        let entry = payload
            .list
            .and_then(|list| list.into_iter().next())
            .ok_or_else(|| FetchError::incomplete("list"))?;
        let main = entry.main.ok_or_else(|| FetchError::incomplete("list[0].main"))?;

        Ok(RawPollutionReading::Ordinal {
            aqi: main.aqi,
            components: entry.components,
        })
    }

    /// Read a WeatherAPI `air_quality` object.
    pub fn from_air_quality(value: Value) -> Result<Self, FetchError> {
        // ---
        let aq: WeatherApiAirQuality = serde_json::from_value(value)?;
        Ok(RawPollutionReading::Composite {
            pollutants: aq.pollutants,
            us_epa_index: aq.us_epa_index,
            uk_defra_index: aq.gb_defra_index,
        })
    }

    /// Classify on the scale that belongs to this variant.
    pub fn into_air_quality(self) -> Result<AirQuality, FetchError> {
        // ---
        match self {
            RawPollutionReading::Ordinal { aqi, components } => {
                Ok(AirQuality::new(AirQualityIndex::ordinal5(aqi)).with_pollutants(components))
            }
            RawPollutionReading::Composite {
                pollutants,
                us_epa_index,
                uk_defra_index,
            } => {
                let epa = us_epa_index
                    .ok_or_else(|| FetchError::incomplete("air_quality.us-epa-index"))?;
                Ok(AirQuality::new(AirQualityIndex::epa6(epa))
                    .with_pollutants(Some(pollutants))
                    .with_uk_defra_index(uk_defra_index))
            }
        }
    }
}

/// Classified air quality. The label is computed from the index when the
/// value is built and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQuality {
    index: AirQualityIndex,
    label: AqiLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pollutants: Option<Pollutants>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uk_defra_index: Option<u8>,
}

impl AirQuality {
    pub fn new(index: AirQualityIndex) -> Self {
        Self {
            index,
            label: index.label(),
            pollutants: None,
            uk_defra_index: None,
        }
    }

    pub fn with_pollutants(mut self, pollutants: Option<Pollutants>) -> Self {
        self.pollutants = pollutants;
        self
    }

    pub fn with_uk_defra_index(mut self, index: Option<u8>) -> Self {
        self.uk_defra_index = index;
        self
    }

    pub fn index(&self) -> AirQualityIndex {
        self.index
    }

    pub fn label(&self) -> AqiLabel {
        self.label
    }

    pub fn pollutants(&self) -> Option<&Pollutants> {
        self.pollutants.as_ref()
    }

    pub fn uk_defra_index(&self) -> Option<u8> {
        self.uk_defra_index
    }
}

/// Normalized, render-ready weather record.
///
/// Wind speed is always km/h and visibility always km, whatever the
/// provider reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayWeather {
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub condition: String,
    pub icon: Option<String>,
    pub humidity_pct: u8,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: Option<f64>,
    pub visibility_km: f64,
    pub location_name: Option<String>,
    pub air_quality: AirQuality,
    pub observed_at: DateTime<Utc>,
}

impl ConditionsPayload {
    /// Remove and parse the bundled `air_quality` object (proxy layout).
    pub fn take_air_quality(&mut self) -> Result<RawPollutionReading, FetchError> {
        // ---
        let value = self
            .air_quality
            .take()
            .ok_or_else(|| FetchError::incomplete("air_quality"))?;
        RawPollutionReading::from_air_quality(value)
    }

    /// Position the provider resolved the request to.
    pub fn coordinates(&self) -> Result<Coordinates, FetchError> {
        // ---
        let coord = self.coord.ok_or_else(|| FetchError::incomplete("coord"))?;
        Coordinates::new(coord.lat, coord.lon)
    }

    /// Combine conditions and pollution into a [`DisplayWeather`].
    ///
    /// Fails with `UpstreamPayloadIncomplete` naming the first missing block.
    pub fn into_display(
        self,
        units: PayloadUnits,
        pollution: RawPollutionReading,
        observed_at: DateTime<Utc>,
    ) -> Result<DisplayWeather, FetchError> {
        // ---
        let main = self.main.ok_or_else(|| FetchError::incomplete("main"))?;
        let condition = self
            .weather
            .and_then(|w| w.into_iter().next())
            .ok_or_else(|| FetchError::incomplete("weather"))?;
        let wind = self.wind.ok_or_else(|| FetchError::incomplete("wind"))?;
        let visibility = self
            .visibility
            .ok_or_else(|| FetchError::incomplete("visibility"))?;
        let air_quality = pollution.into_air_quality()?;

        let (wind_speed_kmh, visibility_km) = match units {
            PayloadUnits::Metric => (ms_to_kmh(wind.speed), meters_to_km(visibility)),
            PayloadUnits::Dashboard => (wind.speed, visibility),
        };

        Ok(DisplayWeather {
            temperature_c: main.temp,
            feels_like_c: main.feels_like,
            condition: condition.main,
            icon: condition.icon,
            humidity_pct: main.humidity.round() as u8,
            pressure_hpa: main.pressure,
            wind_speed_kmh,
            wind_direction_deg: wind.deg,
            visibility_km,
            location_name: self.name.filter(|n| !n.is_empty()),
            air_quality,
            observed_at,
        })
    }
}

impl fmt::Display for DisplayWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        if let Some(name) = &self.location_name {
            write!(f, "{name}: ")?;
        }
        write!(
            f,
            "{:.0}°C {}, humidity {}%, wind {:.0} km/h, visibility {} km, AQI {} {} ({})",
            self.temperature_c,
            self.condition,
            self.humidity_pct,
            self.wind_speed_kmh,
            self.visibility_km,
            self.air_quality.index().scale,
            self.air_quality.index().value,
            self.air_quality.label(),
        )
    }
}
