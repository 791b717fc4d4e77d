use std::time::Duration;

use async_trait::async_trait;

use crate::geometry::GeoPosition;
use crate::observer::error::GeolocationError;
use crate::observer::types::{Fix, ObserverState};

pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the source may hand back. Zero forces a fresh one.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self, options: &GeolocationOptions) -> Result<Fix, GeolocationError>;
}

/// One acquisition attempt, bounded by `options.timeout`. Never retried here.
pub async fn acquire_observer<G>(
    geolocator: &G,
    options: &GeolocationOptions,
) -> Result<ObserverState, GeolocationError>
where
    G: Geolocator + ?Sized,
{
    match tokio::time::timeout(options.timeout, geolocator.locate(options)).await {
        Ok(Ok(fix)) => {
            match fix.accuracy_m {
                Some(accuracy) => log::info!(
                    "Observer located at {:.6}, {:.6} (accuracy {:.2} m)",
                    fix.position.latitude_deg,
                    fix.position.longitude_deg,
                    accuracy
                ),
                None => log::info!(
                    "Observer located at {:.6}, {:.6}",
                    fix.position.latitude_deg,
                    fix.position.longitude_deg
                ),
            }
            Ok(ObserverState::from(fix))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Fix taken from configured coordinates instead of a device.
#[derive(Debug, Clone)]
pub struct StaticGeolocator {
    fix: Option<Fix>,
    enabled: bool,
}

impl StaticGeolocator {
    pub fn new(fix: Option<Fix>, enabled: bool) -> Self {
        Self { fix, enabled }
    }

    /// Parses `"lat, lon"`. Returns `None` for malformed or out-of-range input.
    pub fn from_coordinates(coordinates: &str, accuracy_m: Option<f64>) -> Option<Self> {
        let position = parse_coordinates(coordinates)?;
        Some(Self::new(
            Some(Fix {
                position,
                accuracy_m,
            }),
            true,
        ))
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn locate(&self, _options: &GeolocationOptions) -> Result<Fix, GeolocationError> {
        if !self.enabled {
            return Err(GeolocationError::PermissionDenied);
        }
        self.fix.ok_or(GeolocationError::PositionUnavailable)
    }
}

pub fn parse_coordinates(coordinates: &str) -> Option<GeoPosition> {
    let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return None;
    }
    let lat = parts[0].parse().ok()?;
    let lon = parts[1].parse().ok()?;
    let position = GeoPosition::new(lat, lon);
    position.is_valid().then_some(position)
}
