//! Geofence containment and Smart Start detection
//!
//! The evaluator itself only holds configuration. Arming state lives in a
//! `GeofenceWatch` owned by the caller, one per worker/region pair, so the
//! same evaluator can serve any number of workers.

use chrono::{DateTime, Utc};
use hustle_types::GeofenceConfig;
use serde::{Deserialize, Serialize};

use crate::context::validate_geofence;
use crate::error::{ConfigurationError, InvalidTransitionError, StaleInputError};
use crate::events::LiveSignal;
use crate::geo::GpsSample;

use super::GeofenceRegion;

/// Per-worker arming state for one assigned region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceWatch {
    region: GeofenceRegion,
    /// Last determinate containment (None until the first usable fix)
    inside: Option<bool>,
    /// Number of Smart Start triggers fired for this region
    entries: u32,
}

impl GeofenceWatch {
    pub fn new(region: GeofenceRegion) -> Self {
        Self {
            region,
            inside: None,
            entries: 0,
        }
    }

    pub fn region(&self) -> &GeofenceRegion {
        &self.region
    }

    /// Mutable access for deactivation when the task completes
    pub fn region_mut(&mut self) -> &mut GeofenceRegion {
        &mut self.region
    }

    pub fn is_inside(&self) -> Option<bool> {
        self.inside
    }

    pub fn entries(&self) -> u32 {
        self.entries
    }

    /// Assign a new region, re-arming Smart Start
    pub fn assign(&mut self, region: GeofenceRegion) {
        self.region = region;
        self.inside = None;
        self.entries = 0;
    }
}

/// Result of checking one sample against a region
#[derive(Debug, Clone, PartialEq)]
pub enum ProximityState {
    Determinate {
        distance_m: f64,
        contained: bool,
        /// 0.0 - 1.0 progress-ring fill
        proximity: f64,
    },
    /// The sample can't be trusted; containment is unknown
    Indeterminate { reason: StaleInputError },
}

impl ProximityState {
    pub fn is_contained(&self) -> Option<bool> {
        match self {
            Self::Determinate { contained, .. } => Some(*contained),
            Self::Indeterminate { .. } => None,
        }
    }
}

/// Evaluation output for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceReading {
    pub region_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub state: ProximityState,
    /// Smart Start / exit signals produced by this evaluation
    pub signals: Vec<LiveSignal>,
}

impl GeofenceReading {
    pub fn smart_start_fired(&self) -> bool {
        self.signals
            .iter()
            .any(|s| matches!(s, LiveSignal::SmartStartTriggered { .. }))
    }
}

/// Determines containment and proximity for worker positions
#[derive(Debug, Clone)]
pub struct GeofenceEvaluator {
    config: GeofenceConfig,
}

impl GeofenceEvaluator {
    pub fn new(config: GeofenceConfig) -> Result<Self, ConfigurationError> {
        validate_geofence(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    /// Reject samples that are too inaccurate, too old, or too far in the future.
    /// A negative or non-finite accuracy is never trusted.
    pub fn check_freshness(
        &self,
        sample: &GpsSample,
        now: DateTime<Utc>,
    ) -> Result<(), StaleInputError> {
        let accuracy_m = sample.accuracy_m;
        if !accuracy_m.is_finite() || accuracy_m < 0.0 || accuracy_m > self.config.max_accuracy_m {
            return Err(StaleInputError::Inaccurate {
                accuracy_m: sample.accuracy_m,
                max_accuracy_m: self.config.max_accuracy_m,
            });
        }

        let age_secs = now.signed_duration_since(sample.timestamp).num_seconds();
        if age_secs > i64::from(self.config.staleness_window_secs) {
            return Err(StaleInputError::Stale {
                age_secs,
                window_secs: self.config.staleness_window_secs,
            });
        }
        if -age_secs > i64::from(self.config.max_clock_skew_secs) {
            return Err(StaleInputError::FromFuture {
                ahead_secs: -age_secs,
                max_skew_secs: self.config.max_clock_skew_secs,
            });
        }

        Ok(())
    }

    /// Evaluate a sample against the watched region.
    ///
    /// Smart Start fires on the first determinate "inside" reading and on every
    /// outside → inside transition after that. Indeterminate readings leave
    /// the arming state untouched.
    pub fn evaluate(
        &self,
        watch: &mut GeofenceWatch,
        sample: &GpsSample,
        now: DateTime<Utc>,
    ) -> Result<GeofenceReading, InvalidTransitionError> {
        let region = &watch.region;
        if !region.is_active() {
            return Err(InvalidTransitionError::RegionInactive {
                region_id: region.id().to_string(),
            });
        }

        let region_id = region.id().to_string();

        if !sample.coordinate.is_valid() {
            tracing::warn!(
                region_id = %region_id,
                latitude = sample.coordinate.latitude,
                longitude = sample.coordinate.longitude,
                "Geofence sample has invalid coordinate"
            );
            return Ok(GeofenceReading {
                region_id,
                evaluated_at: now,
                state: ProximityState::Indeterminate {
                    reason: StaleInputError::UnusablePosition {
                        latitude: sample.coordinate.latitude,
                        longitude: sample.coordinate.longitude,
                    },
                },
                signals: Vec::new(),
            });
        }

        if let Err(reason) = self.check_freshness(sample, now) {
            tracing::debug!(region_id = %region_id, %reason, "Geofence reading indeterminate");
            return Ok(GeofenceReading {
                region_id,
                evaluated_at: now,
                state: ProximityState::Indeterminate { reason },
                signals: Vec::new(),
            });
        }

        let distance_m = region.distance_to(sample);
        let contained = region.contains_distance(distance_m);
        let proximity = region.proximity(distance_m);

        let mut signals = Vec::new();
        match (watch.inside, contained) {
            (None | Some(false), true) => {
                watch.entries += 1;
                tracing::info!(
                    region_id = %region_id,
                    task_id = region.task_id(),
                    distance_m,
                    entries = watch.entries,
                    "Smart Start triggered"
                );
                signals.push(LiveSignal::SmartStartTriggered {
                    region_id: region_id.clone(),
                    task_id: region.task_id().to_string(),
                    distance_m,
                    timestamp: sample.timestamp,
                });
            }
            (Some(true), false) => {
                tracing::debug!(region_id = %region_id, distance_m, "Geofence exited, re-armed");
                signals.push(LiveSignal::GeofenceExited {
                    region_id: region_id.clone(),
                    task_id: region.task_id().to_string(),
                    distance_m,
                    timestamp: sample.timestamp,
                });
            }
            _ => {}
        }
        watch.inside = Some(contained);

        Ok(GeofenceReading {
            region_id,
            evaluated_at: now,
            state: ProximityState::Determinate {
                distance_m,
                contained,
                proximity,
            },
            signals,
        })
    }
}
