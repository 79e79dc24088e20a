//! Host location capability.
//!
//! The dashboard asks once per fetch cycle where it is. On a server there is
//! no geolocation prompt, so the position comes from configuration, and a
//! missing position behaves like a denied permission.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::Coordinates;

// ---

/// Single-shot "where am I" lookup.
#[async_trait]
pub trait LocationProvider: Send + Sync + std::fmt::Debug {
    async fn current_coordinates(&self) -> Result<Coordinates, FetchError>;
}

/// A position fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_coordinates(&self) -> Result<Coordinates, FetchError> {
        Ok(self.0)
    }
}

/// No location capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_coordinates(&self) -> Result<Coordinates, FetchError> {
        Err(FetchError::LocationUnavailable(
            "no location configured (set DASHBOARD_LAT and DASHBOARD_LON)".to_string(),
        ))
    }
}
