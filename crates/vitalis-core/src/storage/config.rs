//! TOML-based engine configuration.
//!
//! Stores the tunables that are policy rather than algebra:
//! - Burndown drain rate
//! - Default boost parameters used when a caller omits them
//!
//! Configuration is stored at `~/.config/vitalis/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::energy::LinearBurndown;
use crate::error::StorageError;

/// Burndown policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurndownConfig {
    /// Base energy drained per hour since the last restoration.
    #[serde(default = "default_rate_per_hour")]
    pub rate_per_hour: f64,
}

/// Fallback boost parameters for callers that omit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostDefaults {
    #[serde(default = "default_grace_minutes")]
    pub grace_duration_minutes: f64,
    #[serde(default = "default_decay_rate")]
    pub decay_rate_per_hour: f64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/vitalis/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub burndown: BurndownConfig,
    #[serde(default)]
    pub boost_defaults: BoostDefaults,
}

fn default_rate_per_hour() -> f64 {
    2.0
}
fn default_grace_minutes() -> f64 {
    60.0
}
fn default_decay_rate() -> f64 {
    10.0
}

impl Default for BurndownConfig {
    fn default() -> Self {
        Self {
            rate_per_hour: default_rate_per_hour(),
        }
    }
}

impl Default for BoostDefaults {
    fn default() -> Self {
        Self {
            grace_duration_minutes: default_grace_minutes(),
            decay_rate_per_hour: default_decay_rate(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            burndown: BurndownConfig::default(),
            boost_defaults: BoostDefaults::default(),
        }
    }
}

impl EngineConfig {
    fn config_path() -> Result<PathBuf, StorageError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the config, falling back to defaults when the file is missing.
    pub fn load() -> Result<Self, StorageError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| StorageError::CorruptRow {
            table: "config.toml",
            message: e.to_string(),
        })
    }

    /// Save the config to the default location.
    pub fn save(&self) -> Result<(), StorageError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        let raw = toml::to_string_pretty(self).map_err(|e| StorageError::CorruptRow {
            table: "config.toml",
            message: e.to_string(),
        })?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// The burndown policy this config describes.
    pub fn burndown_policy(&self) -> LinearBurndown {
        LinearBurndown::new(self.burndown.rate_per_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.burndown.rate_per_hour, 2.0);
        assert_eq!(config.boost_defaults.grace_duration_minutes, 60.0);
        assert_eq!(config.boost_defaults.decay_rate_per_hour, 10.0);
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = EngineConfig::default();
        config.burndown.rate_per_hour = 3.5;
        config.save_to(&path).unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.burndown.rate_per_hour, 3.5);
        assert_eq!(loaded.boost_defaults.decay_rate_per_hour, 10.0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = EngineConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.burndown.rate_per_hour, 2.0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[burndown]\nrate_per_hour = 1.0\n").unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.burndown.rate_per_hour, 1.0);
        assert_eq!(loaded.boost_defaults.grace_duration_minutes, 60.0);
    }
}
