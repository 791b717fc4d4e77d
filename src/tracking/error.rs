use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackingError {
    #[error("periodic refresh already running")]
    AlreadyRunning,
    #[error("refresh handle does not belong to the active schedule")]
    UnknownSchedule,
    #[error("refresh interval must be greater than zero")]
    ZeroInterval,
    #[error("periodic refresh needs a running tokio runtime")]
    NoRuntime,
}

/// Why a look angle cannot be computed right now.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookAngleError {
    #[error("observer position unknown, acquire a location first")]
    NoObserverPosition,
    #[error("satellite not found: {0}")]
    UnknownSatellite(String),
    #[error("no position propagated yet for {0}")]
    NotPropagated(String),
}
