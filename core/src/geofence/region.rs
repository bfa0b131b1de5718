//! Circular geofence around a task location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::geo::{Coordinate, GpsSample};

/// A circular region used to detect worker arrival.
///
/// Immutable once created apart from deactivation when its task completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRegion {
    id: String,
    task_id: String,
    center: Coordinate,
    radius_m: f64,
    active: bool,
    created_at: DateTime<Utc>,
}

impl GeofenceRegion {
    /// Create an active region. Rejects non-positive radii and invalid centers.
    pub fn new(
        id: impl Into<String>,
        task_id: impl Into<String>,
        center: Coordinate,
        radius_m: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();

        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ConfigurationError::InvalidRadius {
                region_id: id,
                radius_m,
            });
        }
        if !center.is_valid() {
            return Err(ConfigurationError::InvalidCenter {
                region_id: id,
                latitude: center.latitude,
                longitude: center.longitude,
            });
        }

        Ok(Self {
            id,
            task_id: task_id.into(),
            center,
            radius_m,
            active: true,
            created_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Task completed; the region stops evaluating
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Distance from the sample to the region center in meters
    pub fn distance_to(&self, sample: &GpsSample) -> f64 {
        self.center.distance_to(&sample.coordinate)
    }

    /// Inclusive containment: a sample exactly on the boundary is inside
    pub fn contains_distance(&self, distance_m: f64) -> bool {
        distance_m <= self.radius_m
    }

    pub fn contains(&self, sample: &GpsSample) -> bool {
        self.contains_distance(self.distance_to(sample))
    }

    /// Progress-ring fill: 1.0 at the center, 0.0 at or beyond the boundary
    pub fn proximity(&self, distance_m: f64) -> f64 {
        (1.0 - distance_m / self.radius_m).clamp(0.0, 1.0)
    }
}
