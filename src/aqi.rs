//! Air-quality index classification.
//!
//! Providers report air quality on three incompatible numeric scales. A bare
//! number is never classified: every index travels with the scale it was
//! reported on, so a `3` from a five-band provider and a `3` from the US EPA
//! six-band index end up with different labels.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---

/// Numeric scale an air-quality index is expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AqiScale {
    /// 1–5 ordinal bands (OpenWeather `air_pollution`).
    Ordinal5,
    /// 1–6 US EPA index (WeatherAPI `us-epa-index`).
    Epa6,
    /// Continuous 0–500 US AQI.
    Us500,
}

impl AqiScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiScale::Ordinal5 => "ordinal5",
            AqiScale::Epa6 => "epa6",
            AqiScale::Us500 => "us500",
        }
    }
}

impl fmt::Display for AqiScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical air-quality label shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiLabel {
    Good,
    Fair,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl AqiLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiLabel::Good => "Good",
            AqiLabel::Fair => "Fair",
            AqiLabel::Moderate => "Moderate",
            AqiLabel::Poor => "Poor",
            AqiLabel::VeryPoor => "Very Poor",
            AqiLabel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiLabel::Unhealthy => "Unhealthy",
            AqiLabel::VeryUnhealthy => "Very Unhealthy",
            AqiLabel::Hazardous => "Hazardous",
            AqiLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AqiLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an index on the 1–5 ordinal scale.
pub fn classify_ordinal5(i: i64) -> AqiLabel {
    // ---
    match i {
        1 => AqiLabel::Good,
        2 => AqiLabel::Fair,
        3 => AqiLabel::Moderate,
        4 => AqiLabel::Poor,
        5 => AqiLabel::VeryPoor,
        _ => AqiLabel::Unknown,
    }
}

/// Classify an index on the 1–6 US EPA scale.
pub fn classify_us_epa6(i: i64) -> AqiLabel {
    // ---
    match i {
        1 => AqiLabel::Good,
        2 => AqiLabel::Moderate,
        3 => AqiLabel::UnhealthyForSensitiveGroups,
        4 => AqiLabel::Unhealthy,
        5 => AqiLabel::VeryUnhealthy,
        6 => AqiLabel::Hazardous,
        _ => AqiLabel::Unknown,
    }
}

/// Classify a continuous 0–500 US AQI value. Band edges belong to the lower
/// band, so `50` is Good and `51` is Moderate.
pub fn classify_us_aqi_0_to_500(v: f64) -> AqiLabel {
    // ---
    if v.is_nan() {
        return AqiLabel::Unknown;
    }

    if v <= 50.0 {
        AqiLabel::Good
    } else if v <= 100.0 {
        AqiLabel::Moderate
    } else if v <= 150.0 {
        AqiLabel::UnhealthyForSensitiveGroups
    } else if v <= 200.0 {
        AqiLabel::Unhealthy
    } else if v <= 300.0 {
        AqiLabel::VeryUnhealthy
    } else {
        AqiLabel::Hazardous
    }
}

/// An air-quality index together with the scale it is expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQualityIndex {
    pub scale: AqiScale,
    pub value: f64,
}

impl AirQualityIndex {
    pub fn new(scale: AqiScale, value: f64) -> Self {
        Self { scale, value }
    }

    pub fn ordinal5(value: u8) -> Self {
        Self::new(AqiScale::Ordinal5, f64::from(value))
    }

    pub fn epa6(value: u8) -> Self {
        Self::new(AqiScale::Epa6, f64::from(value))
    }

    pub fn us500(value: f64) -> Self {
        Self::new(AqiScale::Us500, value)
    }

    /// Label for this index on its own scale.
    pub fn label(&self) -> AqiLabel {
        // ---
        match self.scale {
            AqiScale::Ordinal5 => as_band(self.value).map_or(AqiLabel::Unknown, classify_ordinal5),
            AqiScale::Epa6 => as_band(self.value).map_or(AqiLabel::Unknown, classify_us_epa6),
            AqiScale::Us500 => classify_us_aqi_0_to_500(self.value),
        }
    }
}

/// Lookup scales only know whole bands; `2.5` is not a band.
fn as_band(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}
