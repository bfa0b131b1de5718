//! Positions, GPS samples and great-circle distance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Distance to another coordinate in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance_m(self, other)
    }

    /// Point `meters` north of this one (same longitude). Handy for building test fixtures.
    pub fn offset_north(&self, meters: f64) -> Coordinate {
        let delta = (meters / EARTH_RADIUS_M).to_degrees();
        Coordinate::new(self.latitude + delta, self.longitude)
    }
}

/// A single location fix from the location provider. Never mutated once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy radius reported by the device (smaller is better)
    pub accuracy_m: f64,
    /// Instantaneous speed reported by the device, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
}

impl GpsSample {
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>, accuracy_m: f64) -> Self {
        Self {
            coordinate,
            timestamp,
            accuracy_m,
            speed_mps: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// Distance between two fixes in meters
    pub fn distance_to(&self, other: &GpsSample) -> f64 {
        haversine_distance_m(&self.coordinate, &other.coordinate)
    }
}

/// Calculate distance between two coordinates using the Haversine formula.
/// Returns distance in meters.
pub fn haversine_distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}
