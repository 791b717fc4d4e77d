use serde::{Deserialize, Serialize};

/// Ground-projected location, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl GeoPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude_deg)
            && (-180.0..=180.0).contains(&self.longitude_deg)
    }
}

/// One propagation result. Superseded, never mutated, by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub ground: GeoPosition,
    pub altitude_km: f64,
    /// ECI (TEME) velocity in km/s.
    pub velocity_km_s: [f64; 3],
}

impl SatellitePosition {
    pub fn speed_km_s(&self) -> f64 {
        let [vx, vy, vz] = self.velocity_km_s;
        (vx * vx + vy * vy + vz * vz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngle {
    pub distance_km: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub angular_velocity_deg_s: f64,
}

impl LookAngle {
    /// Returned when observer and satellite ground tracks coincide.
    pub const OVERHEAD: LookAngle = LookAngle {
        distance_km: 0.0,
        azimuth_deg: 0.0,
        elevation_deg: 90.0,
        angular_velocity_deg_s: 0.0,
    };

    pub fn is_overhead(&self) -> bool {
        *self == Self::OVERHEAD
    }

    pub fn is_above_horizon(&self) -> bool {
        self.elevation_deg >= 0.0
    }
}
