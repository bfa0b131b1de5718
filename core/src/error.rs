//! Error types shared by the LIVE-mode engines
//!
//! None of these terminate the host. Configuration errors stop construction;
//! everything else degrades to a reported state the caller can branch on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ConfigError;
use crate::movement::SessionStatus;
use crate::quest::QuestStatus;

/// Invalid region or threshold configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("geofence {region_id} has invalid radius {radius_m} m (must be > 0)")]
    InvalidRadius { region_id: String, radius_m: f64 },

    #[error("geofence {region_id} has invalid center ({latitude}, {longitude})")]
    InvalidCenter {
        region_id: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("invalid threshold {name} = {value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("quest {quest_id} has an empty decision window")]
    EmptyDecisionWindow { quest_id: String },
}

/// GPS input too old or too inaccurate to evaluate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StaleInputError {
    #[error("sample accuracy {accuracy_m} m is outside 0..={max_accuracy_m} m")]
    Inaccurate { accuracy_m: f64, max_accuracy_m: f64 },

    #[error("sample is {age_secs}s old (window {window_secs}s)")]
    Stale { age_secs: i64, window_secs: u32 },

    #[error("sample position ({latitude}, {longitude}) is unusable")]
    UnusablePosition { latitude: f64, longitude: f64 },

    #[error("sample is {ahead_secs}s ahead of the clock (skew limit {max_skew_secs}s)")]
    FromFuture { ahead_secs: i64, max_skew_secs: u32 },
}

/// Operation attempted on an entity that can no longer accept it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTransitionError {
    #[error("quest {quest_id} is already {status}; cannot {operation}")]
    QuestTerminal {
        quest_id: String,
        status: QuestStatus,
        operation: &'static str,
    },

    #[error("quest {quest_id} rejected a zero-cent boost")]
    EmptyBoost { quest_id: String },

    #[error("movement session for task {task_id} is {status}; cannot {operation}")]
    SessionClosed {
        task_id: String,
        status: SessionStatus,
        operation: &'static str,
    },

    #[error("geofence {region_id} is inactive")]
    RegionInactive { region_id: String },
}

/// A GPS sample that cannot be appended to a session
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum MalformedSampleError {
    #[error("coordinate ({latitude}, {longitude}) is not a valid position")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("accuracy {accuracy_m} is not a valid radius")]
    InvalidAccuracy { accuracy_m: f64 },

    #[error("reported speed {speed_mps} is not a valid speed")]
    InvalidSpeed { speed_mps: f64 },

    #[error("timestamp {timestamp} does not advance past {previous}")]
    NonMonotonicTimestamp {
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
}

/// Umbrella error for hosts that want a single type
#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    StaleInput(#[from] StaleInputError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    #[error(transparent)]
    MalformedSample(#[from] MalformedSampleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
