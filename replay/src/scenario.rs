//! Scenario files
//!
//! A scenario is a TOML document describing one worker on one task: the
//! geofence, an optional quest offer, the GPS trail and timed quest actions.
//! Times are seconds relative to `meta.start`.
//!
//! ```toml
//! [meta]
//! name = "Walk-in"
//!
//! [region]
//! id = "fence-1"
//! latitude = 47.6062
//! longitude = -122.3321
//! radius_m = 150.0
//!
//! [quest]
//! id = "quest-1"
//! payment_cents = 2500
//!
//! [[sample]]
//! at_secs = 0
//! north_m = 400.0
//!
//! [[event]]
//! at_secs = 5
//! action = "tick"
//! secs = 5
//! ```

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

use hustle_core::{Coordinate, EngineConfig, GpsSample};

use crate::verification::Expectations;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub meta: ScenarioMeta,
    pub region: RegionSpec,

    #[serde(default)]
    pub quest: Option<QuestSpec>,

    /// Engine overrides; missing fields take defaults
    #[serde(default)]
    pub config: Option<EngineConfig>,

    #[serde(default, rename = "sample")]
    pub samples: Vec<SampleSpec>,

    #[serde(default, rename = "event")]
    pub events: Vec<EventSpec>,

    #[serde(default)]
    pub expect: Option<Expectations>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMeta {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Absolute time of t = 0
    #[serde(default = "default_start")]
    pub start: DateTime<Utc>,

    #[serde(default = "default_task_id")]
    pub task_id: String,

    #[serde(default = "default_worker_id")]
    pub worker_id: String,
}

fn default_start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_748_779_200, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_task_id() -> String {
    "task-1".to_string()
}

fn default_worker_id() -> String {
    "worker-1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionSpec {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl RegionSpec {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestSpec {
    pub id: String,
    pub payment_cents: u64,

    /// Overrides the configured decision window
    #[serde(default)]
    pub window_secs: Option<u32>,
}

/// One GPS fix. Position is either absolute or `north_m` meters north of
/// the region center.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleSpec {
    pub at_secs: f64,

    #[serde(default)]
    pub north_m: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default = "default_accuracy_m")]
    pub accuracy_m: f64,

    #[serde(default)]
    pub speed_mps: Option<f64>,

    /// Device timestamp when it differs from delivery time (late or skewed fixes)
    #[serde(default)]
    pub fix_at_secs: Option<f64>,
}

fn default_accuracy_m() -> f64 {
    5.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    pub at_secs: f64,

    #[serde(flatten)]
    pub action: QuestAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum QuestAction {
    /// Count the quest down by `secs`, one second at a time
    Tick { secs: u32 },
    /// Catch the quest up to the scenario clock
    Sync,
    Boost { amount_cents: u64 },
    Accept,
    Decline,
    Cancel,
    /// Close the movement session
    CompleteSession,
}

impl QuestAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Sync => "sync",
            Self::Boost { .. } => "boost",
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
            Self::CompleteSession => "complete_session",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Timeline
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Sample(GpsSample),
    Action(QuestAction),
}

/// A sample or action delivered at a point in scenario time
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(content)?)
    }

    fn offset(&self, secs: f64) -> Result<DateTime<Utc>, String> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("invalid scenario time {secs}"));
        }
        Duration::try_milliseconds((secs * 1000.0).round() as i64)
            .and_then(|offset| self.meta.start.checked_add_signed(offset))
            .ok_or_else(|| format!("scenario time {secs}s is out of range"))
    }

    fn resolve_sample(&self, raw: &SampleSpec) -> Result<GpsSample, String> {
        let coordinate = match (raw.north_m, raw.latitude, raw.longitude) {
            (Some(north_m), None, None) => self.region.center().offset_north(north_m),
            (None, Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
            _ => {
                return Err(format!(
                    "sample at {}s needs either north_m or latitude + longitude",
                    raw.at_secs
                ));
            }
        };
        let timestamp = self.offset(raw.fix_at_secs.unwrap_or(raw.at_secs))?;

        let sample = GpsSample::new(coordinate, timestamp, raw.accuracy_m);
        Ok(match raw.speed_mps {
            Some(speed) => sample.with_speed(speed),
            None => sample,
        })
    }

    /// Samples and actions in delivery order. At equal times, samples come first.
    pub fn timeline(&self) -> Result<Vec<TimelineEntry>, String> {
        let mut entries = Vec::with_capacity(self.samples.len() + self.events.len());

        for raw in &self.samples {
            entries.push(TimelineEntry {
                at: self.offset(raw.at_secs)?,
                kind: EntryKind::Sample(self.resolve_sample(raw)?),
            });
        }
        for event in &self.events {
            entries.push(TimelineEntry {
                at: self.offset(event.at_secs)?,
                kind: EntryKind::Action(event.action.clone()),
            });
        }

        // Stable: keeps file order within a timestamp
        entries.sort_by_key(|entry| entry.at);
        Ok(entries)
    }
}
