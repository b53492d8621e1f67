//! Device geolocation abstraction.

use std::future::Future;
use std::time::Duration;

use crate::error::GeolocationError;
use crate::types::Coordinates;

/// Options for a single-shot position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Upper bound on how long the request may take
    pub timeout: Duration,
    /// Oldest cached device fix that may be reused
    pub maximum_age: Duration,
    pub enable_high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
            enable_high_accuracy: false,
        }
    }
}

/// Source of device coordinates.
pub trait Geolocator {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send;
}

/// Geolocator for hosts without a location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

impl Geolocator for UnsupportedGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Geolocator that always reports the same coordinates (pinned in config).
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    coordinates: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Ok(self.coordinates)
    }
}
