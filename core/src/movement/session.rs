//! Movement session state
//!
//! A session is the ordered GPS trail of one worker on one task, plus the
//! flags derived from it. It only ever grows: samples are appended, flags
//! are recorded once per kind and never removed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GpsSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Suspicious,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Suspicious => "suspicious",
            Self::Completed => "completed",
        })
    }
}

/// Fraud signal categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Implied speed between consecutive fixes is implausible
    ImpossibleSpeed,
    /// Single fix displaced far beyond what the elapsed time allows
    LocationJump,
    /// Worker idled within a small radius for too long
    StationaryTooLong,
}

impl FlagKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ImpossibleSpeed => "impossible_speed",
            Self::LocationJump => "location_jump",
            Self::StationaryTooLong => "stationary_too_long",
        }
    }

    /// Unit of the flag's measurement
    pub fn unit(&self) -> &'static str {
        match self {
            Self::ImpossibleSpeed => "m/s",
            Self::LocationJump => "m",
            Self::StationaryTooLong => "s",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raised flag. Re-detection updates it in place instead of duplicating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementFlag {
    pub kind: FlagKind,
    /// Timestamp of the sample that first tripped the flag
    pub first_detected_at: DateTime<Utc>,
    pub last_detected_at: DateTime<Utc>,
    /// Appends on which the condition was observed
    pub occurrences: u32,
    /// Measurement at first detection (speed, distance or dwell; see `FlagKind::unit`)
    pub measurement: f64,
    /// Largest measurement observed so far
    pub peak: f64,
}

/// Motion between two consecutive accepted samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub distance_m: f64,
    pub elapsed_secs: f64,
    pub speed_mps: f64,
}

impl Segment {
    /// Timestamps must be strictly increasing, so elapsed is always positive
    pub fn between(from: &GpsSample, to: &GpsSample) -> Self {
        let distance_m = from.distance_to(to);
        let elapsed_secs = seconds_between(from.timestamp, to.timestamp);
        let speed_mps = if elapsed_secs > 0.0 {
            distance_m / elapsed_secs
        } else if distance_m > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Self {
            distance_m,
            elapsed_secs,
            speed_mps,
        }
    }
}

/// Fractional seconds between two instants, at nanosecond resolution.
/// Spans too long for nanoseconds fall back to milliseconds.
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Running trip statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub sample_count: usize,
    pub total_distance_m: f64,
    pub duration_secs: f64,
    pub max_speed_mps: f64,
    pub average_speed_mps: f64,
}

impl TripSummary {
    fn record(&mut self, segment: Option<&Segment>) {
        self.sample_count += 1;
        if let Some(segment) = segment {
            self.total_distance_m += segment.distance_m;
            self.duration_secs += segment.elapsed_secs;
            self.max_speed_mps = self.max_speed_mps.max(segment.speed_mps);
            self.average_speed_mps = if self.duration_secs > 0.0 {
                self.total_distance_m / self.duration_secs
            } else {
                0.0
            };
        }
    }
}

/// Tracked GPS trail for one worker on one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSession {
    task_id: String,
    worker_id: String,
    started_at: DateTime<Utc>,
    samples: Vec<GpsSample>,
    status: SessionStatus,
    flags: BTreeMap<FlagKind, MovementFlag>,
    dropped_samples: u32,
    summary: TripSummary,
}

impl MovementSession {
    pub fn start(
        task_id: impl Into<String>,
        worker_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            worker_id: worker_id.into(),
            started_at,
            samples: Vec::new(),
            status: SessionStatus::Active,
            flags: BTreeMap::new(),
            dropped_samples: 0,
            summary: TripSummary::default(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn samples(&self) -> &[GpsSample] {
        &self.samples
    }

    pub fn last_sample(&self) -> Option<&GpsSample> {
        self.samples.last()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn flags(&self) -> impl Iterator<Item = &MovementFlag> {
        self.flags.values()
    }

    pub fn flag(&self, kind: FlagKind) -> Option<&MovementFlag> {
        self.flags.get(&kind)
    }

    pub fn has_flag(&self, kind: FlagKind) -> bool {
        self.flags.contains_key(&kind)
    }

    pub fn flag_kinds(&self) -> Vec<FlagKind> {
        self.flags.keys().copied().collect()
    }

    pub fn dropped_samples(&self) -> u32 {
        self.dropped_samples
    }

    pub fn summary(&self) -> &TripSummary {
        &self.summary
    }

    // ─── Mutation (flagger only) ────────────────────────────────────────────

    pub(super) fn push_sample(&mut self, sample: GpsSample, segment: Option<&Segment>) {
        self.samples.push(sample);
        self.summary.record(segment);
    }

    pub(super) fn record_drop(&mut self) {
        self.dropped_samples += 1;
    }

    /// Record an observation; returns true if this kind was not flagged before
    pub(super) fn record_flag(
        &mut self,
        kind: FlagKind,
        detected_at: DateTime<Utc>,
        measurement: f64,
    ) -> bool {
        match self.flags.get_mut(&kind) {
            Some(flag) => {
                flag.occurrences += 1;
                flag.last_detected_at = detected_at;
                flag.peak = flag.peak.max(measurement);
                false
            }
            None => {
                self.flags.insert(
                    kind,
                    MovementFlag {
                        kind,
                        first_detected_at: detected_at,
                        last_detected_at: detected_at,
                        occurrences: 1,
                        measurement,
                        peak: measurement,
                    },
                );
                true
            }
        }
    }

    /// Re-derive status from flags (completed sessions stay completed)
    pub(super) fn refresh_status(&mut self) {
        if self.status == SessionStatus::Completed {
            return;
        }
        self.status = if self.flags.is_empty() {
            SessionStatus::Active
        } else {
            SessionStatus::Suspicious
        };
    }

    pub(super) fn mark_completed(&mut self) {
        self.status = SessionStatus::Completed;
    }
}
