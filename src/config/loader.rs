//! Defaults File Loading
//!
//! Optional TOML file supplying per-deployment defaults (user, port, gaia
//! mode, timeouts, extra tolerated substrings). CLI flags override anything
//! loaded here. A missing file is normal; a malformed one falls back to
//! defaults with a warning rather than failing the run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{DeviceMode, Timeouts};

/// Shape of the defaults file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDefaults {
    /// Default login user
    pub user: Option<String>,
    /// Default SSH port
    pub port: Option<u16>,
    /// Default device mode (`spark` or `full`)
    pub gaia_mode: Option<DeviceMode>,
    /// Timeout overrides
    pub timeouts: Option<Timeouts>,
    /// Extra tolerated substrings, appended to the built-in set
    pub tolerated: Option<Vec<String>>,
}

/// Defaults file loader
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
        }
    }

    /// Load defaults from the first file found in the search paths, or
    /// built-in defaults when none exists.
    pub fn load() -> FileDefaults {
        let loader = Self::new();
        for path in &loader.search_paths {
            if path.exists() {
                return Self::load_from(path);
            }
        }
        FileDefaults::default()
    }

    /// Load defaults from a specific file, falling back on any failure.
    pub fn load_from(path: &Path) -> FileDefaults {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<FileDefaults>(&content) {
                Ok(defaults) => {
                    debug!("Loaded defaults from {}", path.display());
                    defaults
                }
                Err(e) => {
                    warn!(
                        "Failed to parse defaults file {}: {}. Using built-in defaults",
                        path.display(),
                        e
                    );
                    FileDefaults::default()
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read defaults file {}: {}. Using built-in defaults",
                    path.display(),
                    e
                );
                FileDefaults::default()
            }
        }
    }

    /// Candidate locations, most specific first
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gaiactl").join("config.toml"));
        }
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".gaiactl.toml"));
        }
        paths.push(PathBuf::from("gaiactl.toml"));
        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
