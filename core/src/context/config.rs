//! Engine configuration
//!
//! This module re-exports the shared config types from hustle-types and
//! provides persistence and validation for `EngineConfig`.

use std::path::Path;

pub use hustle_types::{
    AutoBoostConfig, EngineConfig, GeofenceConfig, MovementConfig, QuestConfig,
};

use super::ConfigError;
use crate::error::ConfigurationError;

const APP_NAME: &str = "hustlexp";
const CONFIG_NAME: &str = "engine";

// ─────────────────────────────────────────────────────────────────────────────
// EngineConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for EngineConfig persistence and validation
pub trait EngineConfigExt: Sized {
    fn load() -> Self;
    fn load_with_defaults() -> Self;
    fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn to_toml(&self) -> Result<String, ConfigError>;
    fn validate(&self) -> Result<(), ConfigurationError>;
}

impl EngineConfigExt for EngineConfig {
    /// Load the stored config, falling back to defaults if missing or unreadable
    fn load() -> Self {
        match confy::load::<EngineConfig>(APP_NAME, CONFIG_NAME) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load engine config, using defaults");
                Self::load_with_defaults()
            }
        }
    }

    fn load_with_defaults() -> Self {
        EngineConfig::default()
    }

    /// Load and validate a TOML file. Missing tables and fields take defaults.
    fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        validate_geofence(&self.geofence)?;
        validate_quest(&self.quest)?;
        validate_movement(&self.movement)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Threshold Validation
// ─────────────────────────────────────────────────────────────────────────────

fn positive(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidThreshold {
            name,
            value,
            reason: "must be a positive finite number",
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidThreshold {
            name,
            value,
            reason: "must be a finite number >= 0",
        })
    }
}

fn nonzero(name: &'static str, value: u64) -> Result<(), ConfigurationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidThreshold {
            name,
            value: 0.0,
            reason: "must be greater than zero",
        })
    }
}

pub fn validate_geofence(config: &GeofenceConfig) -> Result<(), ConfigurationError> {
    positive("geofence.max_accuracy_m", config.max_accuracy_m)?;
    nonzero(
        "geofence.staleness_window_secs",
        u64::from(config.staleness_window_secs),
    )
}

pub fn validate_quest(config: &QuestConfig) -> Result<(), ConfigurationError> {
    nonzero(
        "quest.decision_window_secs",
        u64::from(config.decision_window_secs),
    )?;
    if let Some(auto) = &config.auto_boost {
        nonzero("quest.auto_boost.interval_secs", u64::from(auto.interval_secs))?;
        nonzero("quest.auto_boost.amount_cents", auto.amount_cents)?;
    }
    Ok(())
}

pub fn validate_movement(config: &MovementConfig) -> Result<(), ConfigurationError> {
    positive("movement.max_speed_mps", config.max_speed_mps)?;
    positive("movement.jump_speed_bound_mps", config.jump_speed_bound_mps)?;
    non_negative("movement.jump_allowance_m", config.jump_allowance_m)?;
    positive("movement.stationary_radius_m", config.stationary_radius_m)?;
    nonzero(
        "movement.stationary_duration_secs",
        u64::from(config.stationary_duration_secs),
    )?;
    nonzero(
        "movement.stationary_min_samples",
        config.stationary_min_samples as u64,
    )
}
