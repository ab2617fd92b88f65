//! Navigation options as operator-tunable TOML values
//!
//! Every field carries `#[serde(default)]`, so a config file only needs to
//! name the values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the options file.
pub const CONFIG_ENV_VAR: &str = "NAVIGATION_CONFIG";

/// Options file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "navigation.toml";

/// Session-wide navigation settings. Read-only once a session starts.
///
/// Load with `NavigationOptions::load()` which searches:
/// 1. `$NAVIGATION_CONFIG` env var
/// 2. `./navigation.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Replace the displayed location with its projection on the route
    pub snap_to_route: bool,

    /// Debounce distance between off-route evaluations (meters)
    pub off_route_minimum_distance_meters: f64,

    /// Base tolerance around the current step (meters)
    pub off_route_radius: f64,

    pub accuracy_multiplier: f64,

    /// Cap for the accuracy-scaled radius (meters)
    pub max_radius: f64,

    /// Growth in distance-to-maneuver that makes a moving-away run count (meters)
    pub off_route_minimum_distance_before_right_direction: f64,

    /// Consecutive increasing samples that make a moving-away run count
    pub moving_away_run_length: usize,

    /// Arrival radius at the end of a step (meters)
    pub maneuver_zone_radius: f64,

    /// Install the built-in voice and banner milestones
    pub default_milestones_enabled: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            snap_to_route: true,
            off_route_minimum_distance_meters: defaults::OFF_ROUTE_MINIMUM_DISTANCE_M,
            off_route_radius: defaults::OFF_ROUTE_RADIUS_M,
            accuracy_multiplier: defaults::ACCURACY_MULTIPLIER,
            max_radius: defaults::MAX_RADIUS_M,
            off_route_minimum_distance_before_right_direction:
                defaults::MINIMUM_DISTANCE_BEFORE_RIGHT_DIRECTION_M,
            moving_away_run_length: defaults::MOVING_AWAY_RUN_LENGTH,
            maneuver_zone_radius: defaults::MANEUVER_ZONE_RADIUS_M,
            default_milestones_enabled: true,
        }
    }
}

impl NavigationOptions {
    /// Load options using the standard search order:
    /// 1. `$NAVIGATION_CONFIG` environment variable
    /// 2. `./navigation.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(options) => {
                        info!(path = %p.display(), "Loaded navigation options from {CONFIG_ENV_VAR}");
                        return options;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load options from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(options) => {
                    info!("Loaded navigation options from ./{LOCAL_CONFIG_FILE}");
                    return options;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate options from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let options: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject impossible values. Suspicious but legal values are logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Radius used for a fix reporting `accuracy` meters of uncertainty.
    pub fn effective_radius(&self, accuracy: f64) -> f64 {
        self.off_route_radius
            .max(accuracy * self.accuracy_multiplier)
            .min(self.max_radius)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}
