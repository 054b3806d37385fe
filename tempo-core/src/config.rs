use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Coordinate;

/// Value shipped in place of a real key; treated the same as an empty key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_OPENWEATHERMAP_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_APP_GROUP_ID: &str = "group.com.yourcompany.tempo";
pub const DEFAULT_STORE_KEY: &str = "savedWeatherData";
pub const DEFAULT_REFRESH_SECS: u64 = 15 * 60;
/// Longest widget reload interval accepted from a config file (one week).
pub const MAX_REFRESH_SECS: u64 = 7 * 24 * 60 * 60;

/// Coordinate used when the command line does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// lang = "kr"
///
/// [default_location]
/// lat = 37.5683
/// lon = 126.9778
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub units: String,
    pub lang: String,
    pub base_url: String,
    pub app_group_id: String,
    pub store_key: String,
    /// Parent directory of the shared bucket. Platform data dir when unset.
    pub store_root: Option<PathBuf>,
    pub refresh_interval_secs: u64,
    pub default_location: Option<DefaultLocation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            units: "metric".to_string(),
            lang: "kr".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            app_group_id: DEFAULT_APP_GROUP_ID.to_string(),
            store_key: DEFAULT_STORE_KEY.to_string(),
            store_root: None,
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            default_location: None,
        }
    }
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Reject settings that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 || self.refresh_interval_secs > MAX_REFRESH_SECS {
            bail!(
                "refresh_interval_secs must be between 1 and {MAX_REFRESH_SECS}, got {}",
                self.refresh_interval_secs
            );
        }
        Ok(())
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory that holds app-group buckets.
    pub fn store_root(&self) -> Result<PathBuf> {
        match &self.store_root {
            Some(root) => Ok(root.clone()),
            None => Ok(project_dirs()?.data_dir().join("groups")),
        }
    }

    pub fn has_api_key(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn default_coordinate(&self) -> Option<Coordinate> {
        self.default_location
            .map(|loc| Coordinate::new(loc.lat, loc.lon))
    }
}

/// A key is usable when it is neither blank nor the shipped placeholder.
pub fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != API_KEY_PLACEHOLDER
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "tempo", "tempo")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
