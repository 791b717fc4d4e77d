//! Spherical-Earth look-angle math. Degrees at the boundary, radians inside.

use super::types::{GeoPosition, LookAngle, SatellitePosition};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Surface distances at or below this are treated as "directly overhead".
pub const OVERHEAD_EPSILON_KM: f64 = 1e-6;

/// Haversine great-circle distance in km.
pub fn distance(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let d_lat = b.lat_rad() - a.lat_rad();
    let d_lon = b.lon_rad() - a.lon_rad();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat_rad().cos() * b.lat_rad().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from `from` to `to`, in [0, 360).
///
/// At the poles the east/north components collapse; from (0, 0) to (90, 0)
/// this yields `atan2(0, 1)`, i.e. 0°.
pub fn bearing(from: &GeoPosition, to: &GeoPosition) -> f64 {
    let (lat1, lat2) = (from.lat_rad(), to.lat_rad());
    let d_lon = to.lon_rad() - from.lon_rad();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let mut azimuth = y.atan2(x).to_degrees();
    if azimuth < 0.0 {
        azimuth += 360.0;
    }
    // -1e-15 + 360 rounds to 360
    if azimuth >= 360.0 {
        azimuth -= 360.0;
    }
    azimuth
}

/// Elevation of `target` seen from `observer`, given their surface distance.
///
/// Negative below the horizon. `surface_distance_km` must be > 0.
pub fn elevation(
    _observer: &GeoPosition,
    target: &SatellitePosition,
    surface_distance_km: f64,
) -> f64 {
    let central_angle = surface_distance_km / EARTH_RADIUS_KM;
    let rise = (EARTH_RADIUS_KM + target.altitude_km) * central_angle.sin();
    let drop = EARTH_RADIUS_KM * (1.0 - central_angle.cos());

    (rise - drop).atan2(surface_distance_km).to_degrees()
}

/// Approximate angular rate across the sky in deg/s.
///
/// Uses the total speed over the surface distance rather than the component
/// transverse to the line of sight, so it overestimates for satellites
/// moving towards or away from the observer. The distance must be > 0.
pub fn angular_velocity(
    observer: &GeoPosition,
    target: &GeoPosition,
    velocity_km_s: [f64; 3],
) -> f64 {
    let [vx, vy, vz] = velocity_km_s;
    let speed = (vx * vx + vy * vy + vz * vz).sqrt();
    (speed / distance(observer, target)).to_degrees()
}

/// All look-angle quantities at once, short-circuiting the degenerate
/// overhead case.
pub fn look_angle(observer: &GeoPosition, target: &SatellitePosition) -> LookAngle {
    let distance_km = distance(observer, &target.ground);
    if distance_km <= OVERHEAD_EPSILON_KM {
        return LookAngle::OVERHEAD;
    }

    LookAngle {
        distance_km,
        azimuth_deg: bearing(observer, &target.ground),
        elevation_deg: elevation(observer, target, distance_km),
        angular_velocity_deg_s: angular_velocity(observer, &target.ground, target.velocity_km_s),
    }
}
