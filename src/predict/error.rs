use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("invalid tle format")]
    InvalidTleFormat,
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("invalid tle: {0}")]
    Tle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
}

/// Propagation could not produce a position for the requested instant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("epoch conversion failed: {0}")]
    Epoch(String),
    #[error("sgp4 propagation failed: {0}")]
    Sgp4(String),
    #[error("non-finite geodetic position")]
    NonFinite,
    #[error("no position available: {0}")]
    Unavailable(String),
}
