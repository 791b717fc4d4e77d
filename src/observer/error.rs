use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeolocationError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out")]
    Timeout,
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "Permission to access the location was denied.",
            GeolocationError::PositionUnavailable => "Location information is unavailable.",
            GeolocationError::Timeout => "The request to get the location timed out.",
            GeolocationError::Unknown(_) => {
                "An unknown error occurred while getting the location."
            }
        }
    }
}
