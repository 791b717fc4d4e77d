use std::fmt;

use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

/// Parsed two-line element set. Passed through the tracking layer untouched.
pub struct OrbitalElements {
    elements: Elements,
    constants: Constants,
}

impl OrbitalElements {
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self, PredictError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.elements.object_name.as_deref()
    }

    pub fn norad_id(&self) -> u32 {
        self.elements.norad_id as u32
    }

    pub(crate) fn elements(&self) -> &Elements {
        &self.elements
    }

    pub(crate) fn constants(&self) -> &Constants {
        &self.constants
    }
}

impl fmt::Debug for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElements")
            .field("name", &self.name())
            .field("norad_id", &self.norad_id())
            .finish()
    }
}

/// Split a 2- or 3-line TLE block into (name, line1, line2).
pub fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), PredictError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        _ => Err(PredictError::InvalidTleFormat),
    }
}
