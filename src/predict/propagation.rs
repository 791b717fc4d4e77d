use chrono::{DateTime, Utc};

use crate::geometry::{GeoPosition, SatellitePosition};
use crate::predict::elements::OrbitalElements;
use crate::predict::error::PropagationError;

// WGS-84
const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const GEODETIC_TOLERANCE_RAD: f64 = 1e-10;
const GEODETIC_MAX_ITERATIONS: usize = 10;

/// Produces a fresh geodetic position for a satellite at an instant.
pub trait Propagator: Send + Sync {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<SatellitePosition, PropagationError>;
}

impl<F> Propagator for F
where
    F: Fn(&OrbitalElements, DateTime<Utc>) -> Result<SatellitePosition, PropagationError>
        + Send
        + Sync,
{
    fn propagate(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<SatellitePosition, PropagationError> {
        self(elements, at)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate(
        &self,
        elements: &OrbitalElements,
        at: DateTime<Utc>,
    ) -> Result<SatellitePosition, PropagationError> {
        let minutes = elements
            .elements()
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| PropagationError::Epoch(e.to_string()))?;

        let prediction = elements
            .constants()
            .propagate(minutes)
            .map_err(|e| PropagationError::Sgp4(e.to_string()))?;

        let gmst =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()));

        let ecef = teme_to_ecef_position(prediction.position, gmst);
        let (ground, altitude_km) = ecef_to_geodetic(ecef);

        let finite = ground.latitude_deg.is_finite()
            && ground.longitude_deg.is_finite()
            && altitude_km.is_finite()
            && prediction.velocity.iter().all(|v| v.is_finite());
        if !finite {
            return Err(PropagationError::NonFinite);
        }

        Ok(SatellitePosition {
            ground,
            altitude_km,
            velocity_km_s: prediction.velocity,
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// Earth-fixed km to WGS-84 latitude / longitude (degrees) and height (km).
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> (GeoPosition, f64) {
    let [x, y, z] = ecef;
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let r = (x * x + y * y).sqrt();

    let longitude = wrap_pi(y.atan2(x));
    let mut latitude = z.atan2(r);
    let mut c = 1.0;

    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let phi = latitude;
        c = 1.0 / (1.0 - e2 * phi.sin() * phi.sin()).sqrt();
        latitude = (z + WGS84_A_KM * c * e2 * phi.sin()).atan2(r);
        if (latitude - phi).abs() < GEODETIC_TOLERANCE_RAD {
            break;
        }
    }

    let height = r / latitude.cos() - WGS84_A_KM * c;
    (
        GeoPosition::new(latitude.to_degrees(), longitude.to_degrees()),
        height,
    )
}

fn wrap_pi(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::elements::fixtures;
    use chrono::TimeZone;

    #[test]
    fn equatorial_point_on_surface() {
        let (ground, height) = ecef_to_geodetic([WGS84_A_KM + 700.0, 0.0, 0.0]);
        assert!(ground.latitude_deg.abs() < 1e-9);
        assert!(ground.longitude_deg.abs() < 1e-9);
        assert!((height - 700.0).abs() < 1e-6);
    }

    #[test]
    fn western_hemisphere_longitude_is_negative() {
        let (ground, _) = ecef_to_geodetic([0.0, -7000.0, 0.0]);
        assert!((ground.longitude_deg + 90.0).abs() < 1e-9);
    }

    #[test]
    fn teme_rotation_preserves_radius() {
        let pos = [4000.0, -3000.0, 5000.0];
        let rotated = teme_to_ecef_position(pos, 1.234);
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((norm(pos) - norm(rotated)).abs() < 1e-9);
        assert_eq!(rotated[2], pos[2]);
    }

    #[test]
    fn landsat_8_near_epoch_is_in_leo() {
        let elements = fixtures::landsat_8();
        // epoch 25211.17113308 is 2025-07-30 ~04:06 UTC
        let at = Utc.with_ymd_and_hms(2025, 7, 30, 6, 0, 0).unwrap();
        let position = Sgp4Propagator.propagate(&elements, at).unwrap();

        assert!(position.ground.is_valid(), "{position:?}");
        assert!(
            (680.0..740.0).contains(&position.altitude_km),
            "altitude {}",
            position.altitude_km
        );
        assert!((7.0..8.0).contains(&position.speed_km_s()));
        // sun-synchronous orbit, inclination 98.2
        assert!(position.ground.latitude_deg.abs() <= 82.5);
    }

    #[test]
    fn closures_act_as_propagators() {
        let failing = |_: &OrbitalElements,
                       _: DateTime<Utc>|
         -> Result<SatellitePosition, PropagationError> {
            Err(PropagationError::Unavailable("offline".into()))
        };
        let elements = fixtures::landsat_8();
        let result = failing.propagate(&elements, Utc::now());
        assert_eq!(
            result,
            Err(PropagationError::Unavailable("offline".into()))
        );
    }
}
