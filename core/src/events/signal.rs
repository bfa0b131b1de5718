use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MalformedSampleError;
use crate::movement::{FlagKind, TripSummary};

/// Signals emitted by the LIVE-mode engines for the notification/haptics layer.
/// Each one is emitted exactly once per qualifying transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiveSignal {
    // ─── Geofence ──────────────────────────────────────────────────────────────
    /// Worker entered the task geofence (armed → inside)
    SmartStartTriggered {
        region_id: String,
        task_id: String,
        distance_m: f64,
        timestamp: DateTime<Utc>,
    },
    /// Worker left the geofence; Smart Start is re-armed
    GeofenceExited {
        region_id: String,
        task_id: String,
        distance_m: f64,
        timestamp: DateTime<Utc>,
    },

    // ─── Quest ─────────────────────────────────────────────────────────────────
    PriceBoostApplied {
        quest_id: String,
        task_id: String,
        boost_cents: u64,
        current_payment_cents: u64,
        boost_count: u32,
        /// Applied by the auto-boost schedule rather than an explicit call
        automatic: bool,
    },
    QuestExpired {
        quest_id: String,
        task_id: String,
        final_payment_cents: u64,
        /// Seconds of broadcast before expiry
        elapsed_secs: u32,
    },
    QuestAccepted {
        quest_id: String,
        task_id: String,
        payment_cents: u64,
        remaining_secs: u32,
    },
    QuestDeclined {
        quest_id: String,
        task_id: String,
        remaining_secs: u32,
    },

    // ─── Movement ──────────────────────────────────────────────────────────────
    MovementFlagRaised {
        task_id: String,
        worker_id: String,
        flag: FlagKind,
        timestamp: DateTime<Utc>,
    },
    SampleDropped {
        task_id: String,
        worker_id: String,
        reason: MalformedSampleError,
    },
    SessionCompleted {
        task_id: String,
        worker_id: String,
        summary: TripSummary,
    },
}

impl LiveSignal {
    /// Task the signal belongs to
    pub fn task_id(&self) -> &str {
        match self {
            Self::SmartStartTriggered { task_id, .. }
            | Self::GeofenceExited { task_id, .. }
            | Self::PriceBoostApplied { task_id, .. }
            | Self::QuestExpired { task_id, .. }
            | Self::QuestAccepted { task_id, .. }
            | Self::QuestDeclined { task_id, .. }
            | Self::MovementFlagRaised { task_id, .. }
            | Self::SampleDropped { task_id, .. }
            | Self::SessionCompleted { task_id, .. } => task_id,
        }
    }

    /// Short label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Self::SmartStartTriggered { .. } => "smart_start",
            Self::GeofenceExited { .. } => "geofence_exit",
            Self::PriceBoostApplied { .. } => "price_boost",
            Self::QuestExpired { .. } => "quest_expired",
            Self::QuestAccepted { .. } => "quest_accepted",
            Self::QuestDeclined { .. } => "quest_declined",
            Self::MovementFlagRaised { .. } => "movement_flag",
            Self::SampleDropped { .. } => "sample_dropped",
            Self::SessionCompleted { .. } => "session_completed",
        }
    }
}
