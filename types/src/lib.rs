//! Shared configuration types for HustleXP LIVE mode
//!
//! This crate contains serializable configuration types that are shared between
//! the engine library (hustle-core) and the tooling that drives it (hustle-replay).
//! Every field carries a serde default so partial TOML files load cleanly.

use serde::{Deserialize, Serialize};

/// RGBA color used for presentation hints
pub type Color = [u8; 4];

// ─────────────────────────────────────────────────────────────────────────────
// Engine Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration for the LIVE-mode engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub quest: QuestConfig,
    #[serde(default)]
    pub movement: MovementConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// Geofence
// ─────────────────────────────────────────────────────────────────────────────

/// Input quality gates for geofence evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Samples with a horizontal accuracy worse than this are indeterminate
    #[serde(default = "default_max_accuracy_m")]
    pub max_accuracy_m: f64,
    /// Samples older than this (relative to the evaluation clock) are indeterminate
    #[serde(default = "default_staleness_window_secs")]
    pub staleness_window_secs: u32,
    /// Tolerated amount of sample timestamps running ahead of the clock
    #[serde(default = "default_max_clock_skew_secs")]
    pub max_clock_skew_secs: u32,
}

fn default_max_accuracy_m() -> f64 {
    50.0
}
fn default_staleness_window_secs() -> u32 {
    30
}
fn default_max_clock_skew_secs() -> u32 {
    5
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: default_max_accuracy_m(),
            staleness_window_secs: default_staleness_window_secs(),
            max_clock_skew_secs: default_max_clock_skew_secs(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quest
// ─────────────────────────────────────────────────────────────────────────────

/// Quest offer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestConfig {
    /// Decision window used when a broadcast doesn't specify one
    #[serde(default = "default_decision_window_secs")]
    pub decision_window_secs: u32,
    /// Automatic price boosts while the offer stays unaccepted (None = manual only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_boost: Option<AutoBoostConfig>,
}

fn default_decision_window_secs() -> u32 {
    60
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            decision_window_secs: default_decision_window_secs(),
            auto_boost: None,
        }
    }
}

/// Schedule for automatic price boosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBoostConfig {
    /// Seconds of broadcast between boosts
    pub interval_secs: u32,
    /// Amount added per boost, in cents
    pub amount_cents: u64,
    /// Cap on automatic boosts per quest
    #[serde(default = "default_max_boosts")]
    pub max_boosts: u32,
}

fn default_max_boosts() -> u32 {
    3
}

// ─────────────────────────────────────────────────────────────────────────────
// Movement
// ─────────────────────────────────────────────────────────────────────────────

/// Thresholds for movement fraud flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Implied speed between consecutive samples above this raises `impossible_speed`
    #[serde(default = "default_max_speed_mps")]
    pub max_speed_mps: f64,
    /// Speed bound used to size the plausible displacement for `location_jump`
    #[serde(default = "default_jump_speed_bound_mps")]
    pub jump_speed_bound_mps: f64,
    /// Fixed displacement allowance added on top of the jump speed bound
    #[serde(default = "default_jump_allowance_m")]
    pub jump_allowance_m: f64,
    /// Radius within which trailing samples count as stationary
    #[serde(default = "default_stationary_radius_m")]
    pub stationary_radius_m: f64,
    /// Dwell time after which a stationary run raises `stationary_too_long`
    #[serde(default = "default_stationary_duration_secs")]
    pub stationary_duration_secs: u32,
    /// Minimum samples in a stationary run before it counts
    #[serde(default = "default_stationary_min_samples")]
    pub stationary_min_samples: usize,
}

fn default_max_speed_mps() -> f64 {
    70.0
}
fn default_jump_speed_bound_mps() -> f64 {
    50.0
}
fn default_jump_allowance_m() -> f64 {
    1000.0
}
fn default_stationary_radius_m() -> f64 {
    25.0
}
fn default_stationary_duration_secs() -> u32 {
    900
}
fn default_stationary_min_samples() -> usize {
    3
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed_mps: default_max_speed_mps(),
            jump_speed_bound_mps: default_jump_speed_bound_mps(),
            jump_allowance_m: default_jump_allowance_m(),
            stationary_radius_m: default_stationary_radius_m(),
            stationary_duration_secs: default_stationary_duration_secs(),
            stationary_min_samples: default_stationary_min_samples(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presentation Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Default colors handed to the presentation layer
pub mod urgency_colors {
    use super::Color;

    pub const CRITICAL: Color = [220, 50, 50, 255]; // Red
    pub const ELEVATED: Color = [240, 160, 40, 255]; // Orange
    pub const NORMAL: Color = [60, 180, 90, 255]; // Green
}
