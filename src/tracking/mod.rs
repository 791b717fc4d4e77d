mod controller;
mod error;
mod roster;
mod types;

pub use controller::{RefreshHandle, TrackingController, DEFAULT_REFRESH_INTERVAL};
pub use error::{LookAngleError, TrackingError};
pub use roster::Roster;
pub use types::{
    RefreshEvent, RefreshSummary, SatelliteSpec, SatelliteStatus, TrackState, TrackedSatellite,
    Transition,
};
