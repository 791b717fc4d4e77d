use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::predict::elements::OrbitalElements;
use crate::predict::error::PredictError;

/// Elements compiled in for when nothing else is configured.
pub const BUILTIN_TLES: [(&str, &str, &str); 2] = [
    (
        "Landsat 8",
        "1 39084U 13008A   25211.17113308  .00000344  00000-0  86359-4 0  9997",
        "2 39084  98.2234 281.1159 0001236  89.8938 270.2402 14.57113439662827",
    ),
    (
        "Landsat 9",
        "1 49260U 21088A   23256.48693210  .00000142  00000-0  48706-4 0  9997",
        "2 49260  98.2100 184.9175 0001256  92.3065 267.8408 14.57110519316512",
    ),
];

pub struct TleEntry {
    pub name: String,
    pub elements: OrbitalElements,
    pub source: String,
}

/// Loads every `.tle` / `.txt` file in a directory, keyed by satellite name.
pub struct TleLoader {
    tle_dir: PathBuf,
    satellites: BTreeMap<String, TleEntry>,
}

impl TleLoader {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            satellites: BTreeMap::new(),
        }
    }

    pub fn load_all(&mut self) -> Result<(), PredictError> {
        if !self.tle_dir.exists() {
            return Err(PredictError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        self.satellites.clear();

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .is_some_and(|ext| ext == "tle" || ext == "txt");
            if path.is_file() && is_tle {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            match parse_tle_file(&path) {
                Ok(entries) => {
                    for entry in entries {
                        if self.satellites.contains_key(&entry.name) {
                            log::warn!(
                                "{} redefined by {}, keeping the later entry",
                                entry.name,
                                entry.source
                            );
                        }
                        self.satellites.insert(entry.name.clone(), entry);
                    }
                }
                Err(e) => {
                    // one bad file must not hide the rest
                    log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "Loaded {} satellites from {}",
            self.satellites.len(),
            self.tle_dir.display()
        );
        Ok(())
    }

    pub fn into_entries(self) -> Vec<TleEntry> {
        self.satellites.into_values().collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.satellites.len()
    }
}

fn parse_tle_file(path: &Path) -> Result<Vec<TleEntry>, PredictError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    parse_tle_text(&content, &filename)
}

/// Parse multi-satellite TLE text. Unnamed sets are called `NORAD <id>`.
pub fn parse_tle_text(content: &str, source: &str) -> Result<Vec<TleEntry>, PredictError> {
    let mut results = Vec::new();

    for (name, line1, line2) in split_multi_tle(content) {
        let elements = OrbitalElements::from_tle(name.clone(), &line1, &line2).map_err(|e| {
            PredictError::InvalidTle {
                file: source.to_string(),
                message: e.to_string(),
            }
        })?;
        let name = name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id()));

        results.push(TleEntry {
            name,
            elements,
            source: source.to_string(),
        });
    }

    Ok(results)
}

pub fn builtin_entries() -> Result<Vec<TleEntry>, PredictError> {
    BUILTIN_TLES
        .iter()
        .map(|(name, line1, line2)| {
            Ok(TleEntry {
                name: name.to_string(),
                elements: OrbitalElements::from_tle(Some(name.to_string()), line1, line2)?,
                source: "builtin".to_string(),
            })
        })
        .collect()
}

fn split_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
