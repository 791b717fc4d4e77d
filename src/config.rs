use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::observer::{
    parse_coordinates, Fix, GeolocationOptions, StaticGeolocator, DEFAULT_GEOLOCATION_TIMEOUT,
};
use crate::predict::{
    builtin_entries, parse_tle_lines, OrbitalElements, PredictError, TleEntry, TleLoader,
};
use crate::tracking::{SatelliteSpec, DEFAULT_REFRESH_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid observer coordinates: {0}")]
    Coordinates(String),
    #[error("satellite {name}: {source}")]
    Satellite { name: String, source: PredictError },
    #[error("TLE error: {0}")]
    Tle(#[from] PredictError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub satellites: Vec<SatelliteConfig>,
    pub tle_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    pub coordinates: Option<String>,
    pub accuracy_m: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            coordinates: None,
            accuracy_m: None,
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub refresh_interval: Duration,
    #[serde(
        default = "default_geolocation_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub geolocation_timeout: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            geolocation_timeout: default_geolocation_timeout(),
        }
    }
}

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

fn default_geolocation_timeout() -> Duration {
    DEFAULT_GEOLOCATION_TIMEOUT
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteConfig {
    pub name: String,
    pub tle: String,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        if let Some(coordinates) = &config.observer.coordinates {
            if parse_coordinates(coordinates).is_none() {
                return Err(ConfigError::Coordinates(coordinates.clone()));
            }
        }
        Ok(config)
    }

    /// Uses `override_coordinates` in place of the configured ones when given.
    pub fn geolocator(
        &self,
        override_coordinates: Option<&str>,
    ) -> Result<StaticGeolocator, ConfigError> {
        let coordinates = override_coordinates.or(self.observer.coordinates.as_deref());
        let fix = match coordinates {
            Some(text) => {
                let position = parse_coordinates(text)
                    .ok_or_else(|| ConfigError::Coordinates(text.to_string()))?;
                Some(Fix {
                    position,
                    accuracy_m: self.observer.accuracy_m,
                })
            }
            None => None,
        };
        Ok(StaticGeolocator::new(fix, self.observer.enabled))
    }

    pub fn geolocation_options(&self) -> GeolocationOptions {
        GeolocationOptions {
            timeout: self.tracking.geolocation_timeout,
            ..GeolocationOptions::default()
        }
    }

    /// Folder entries first, then inline ones. Inline entries replace folder
    /// entries of the same name. Falls back to the builtin Landsat sets.
    pub fn satellite_specs(&self) -> Result<Vec<SatelliteSpec>, ConfigError> {
        let mut entries: Vec<TleEntry> = Vec::new();

        if let Some(folder) = &self.tle_folder {
            let mut loader = TleLoader::new(folder.clone());
            loader.load_all()?;
            entries.extend(loader.into_entries());
        }

        for satellite in &self.satellites {
            let entry = inline_entry(satellite).map_err(|source| ConfigError::Satellite {
                name: satellite.name.clone(),
                source,
            })?;
            match entries.iter().position(|e| e.name == entry.name) {
                Some(index) => entries[index] = entry,
                None => entries.push(entry),
            }
        }

        if entries.is_empty() {
            log::info!("No satellites configured, using builtin elements");
            entries = builtin_entries()?;
        }

        Ok(entries
            .into_iter()
            .map(|entry| SatelliteSpec {
                id: entry.name,
                elements: entry.elements,
            })
            .collect())
    }
}

fn inline_entry(satellite: &SatelliteConfig) -> Result<TleEntry, PredictError> {
    let (_, line1, line2) = parse_tle_lines(&satellite.tle)?;
    let elements = OrbitalElements::from_tle(Some(satellite.name.clone()), &line1, &line2)?;
    Ok(TleEntry {
        name: satellite.name.clone(),
        elements,
        source: "config".to_string(),
    })
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
