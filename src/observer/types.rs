use serde::Serialize;

use crate::geometry::GeoPosition;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fix {
    pub position: GeoPosition,
    /// Meters, when the source reports one.
    pub accuracy_m: Option<f64>,
}

/// Where the observer is, once known. Always replaced as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ObserverState {
    pub position: Option<GeoPosition>,
    pub accuracy_m: Option<f64>,
}

impl ObserverState {
    pub fn at(position: GeoPosition) -> Self {
        Self {
            position: Some(position),
            accuracy_m: None,
        }
    }
}

impl From<Fix> for ObserverState {
    fn from(fix: Fix) -> Self {
        Self {
            position: Some(fix.position),
            accuracy_m: fix.accuracy_m,
        }
    }
}
