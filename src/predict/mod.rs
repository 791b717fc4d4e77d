mod elements;
mod error;
mod propagation;
mod tle_loader;

#[cfg(test)]
pub(crate) use elements::fixtures;
pub use elements::{parse_tle_lines, OrbitalElements};
pub use error::{PredictError, PropagationError};
pub use propagation::{Propagator, Sgp4Propagator};
pub use tle_loader::{builtin_entries, parse_tle_text, TleEntry, TleLoader};
