mod engine;
mod types;

pub use engine::{
    angular_velocity, bearing, distance, elevation, look_angle, EARTH_RADIUS_KM,
    OVERHEAD_EPSILON_KM,
};
pub use types::{GeoPosition, LookAngle, SatellitePosition};
