mod error;
mod geolocator;
mod types;

pub use error::GeolocationError;
pub use geolocator::{
    acquire_observer, parse_coordinates, Geolocator, GeolocationOptions, StaticGeolocator,
    DEFAULT_GEOLOCATION_TIMEOUT,
};
pub use types::{Fix, ObserverState};
