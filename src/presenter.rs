use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geometry::{GeoPosition, LookAngle, SatellitePosition};
use crate::observer::GeolocationError;
use crate::predict::PropagationError;
use crate::tracking::Transition;

/// Receives everything the tracking core wants shown.
pub trait Presenter: Send + Sync {
    fn position_updated(&self, id: &str, position: &SatellitePosition, transition: Transition);
    fn position_stale(&self, id: &str, error: &PropagationError);
    fn look_angle(&self, report: &LookAngleReport);
    fn location_failed(&self, error: &GeolocationError);
}

#[derive(Debug, Clone, Serialize)]
pub struct LookAngleReport {
    pub satellite: String,
    /// When the satellite position was propagated.
    pub position_time: DateTime<Utc>,
    pub stale: bool,
    pub observer: GeoPosition,
    pub position: SatellitePosition,
    pub look_angle: LookAngle,
}

impl fmt::Display for LookAngleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let angles = &self.look_angle;
        writeln!(f, "=== LOOK ANGLE ===")?;
        writeln!(f, "Position time: {}", self.position_time.to_rfc3339())?;
        if self.stale {
            writeln!(f, "(latest propagation failed, showing last good position)")?;
        }
        writeln!(f)?;
        writeln!(f, "[POSITIONS]")?;
        writeln!(f, "Observer:")?;
        writeln!(f, "  Latitude:  {:.6}°", self.observer.latitude_deg)?;
        writeln!(f, "  Longitude: {:.6}°", self.observer.longitude_deg)?;
        writeln!(f)?;
        writeln!(f, "Satellite {}:", self.satellite)?;
        writeln!(f, "  Latitude:  {:.6}°", self.position.ground.latitude_deg)?;
        writeln!(f, "  Longitude: {:.6}°", self.position.ground.longitude_deg)?;
        writeln!(f, "  Altitude:  {:.2} km", self.position.altitude_km)?;
        writeln!(f)?;
        writeln!(f, "[RESULTS]")?;
        writeln!(f, "Distance:         {:.2} km", angles.distance_km)?;
        writeln!(f, "Azimuth:          {:.2}°", angles.azimuth_deg)?;
        writeln!(f, "Elevation:        {:.2}°", angles.elevation_deg)?;
        write!(f, "Angular velocity: {:.6}°/s", angles.angular_velocity_deg_s)
    }
}

/// Prints look-angle reports on stdout, logs everything else.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn position_updated(&self, id: &str, position: &SatellitePosition, transition: Transition) {
        log::info!(
            "{} {}: lat {:.4}° lon {:.4}° alt {:.2} km speed {:.2} km/s",
            transition,
            id,
            position.ground.latitude_deg,
            position.ground.longitude_deg,
            position.altitude_km,
            position.speed_km_s()
        );
    }

    fn position_stale(&self, id: &str, error: &PropagationError) {
        log::warn!("{}: keeping last position, propagation failed: {}", id, error);
    }

    fn look_angle(&self, report: &LookAngleReport) {
        println!("{}", report);
        if !report.look_angle.is_above_horizon() {
            log::info!("{} is below the horizon", report.satellite);
        }
    }

    fn location_failed(&self, error: &GeolocationError) {
        log::error!("{} ({})", error.user_message(), error);
    }
}
