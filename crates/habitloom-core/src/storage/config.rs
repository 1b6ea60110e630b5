//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer tick cadence and broadcast settings
//! - Defaults applied to newly created habits
//!
//! Configuration is stored at `~/.config/habitloom/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

use super::data_dir;

/// Timer-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Tick cadence for the watch loop, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Whether session snapshots are broadcast to the activity file.
    #[serde(default = "default_true")]
    pub broadcast_enabled: bool,
    /// Override for the activity file path (defaults to the data dir).
    #[serde(default)]
    pub activity_file: Option<String>,
}

/// Defaults for newly created habits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_metric_value")]
    pub metric_value: f64,
    #[serde(default = "default_goal_value")]
    pub goal_value: f64,
    #[serde(default = "default_metric_unit")]
    pub metric_unit: String,
    /// Daily minutes goal for new timer habits.
    #[serde(default = "default_timer_goal_minutes")]
    pub timer_goal_minutes: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitloom/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    250
}
fn default_true() -> bool {
    true
}
fn default_metric_value() -> f64 {
    1.0
}
fn default_goal_value() -> f64 {
    1.0
}
fn default_metric_unit() -> String {
    "times".to_string()
}
fn default_timer_goal_minutes() -> f64 {
    25.0
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            broadcast_enabled: true,
            activity_file: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            metric_value: default_metric_value(),
            goal_value: default_goal_value(),
            metric_unit: default_metric_unit(),
            timer_goal_minutes: default_timer_goal_minutes(),
        }
    }
}

impl Config {
    pub fn path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/habitloom"),
            message: e.to_string(),
        })?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("~/.config/habitloom"),
            message: e.to_string(),
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}
