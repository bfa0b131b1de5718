//! Quest alert state (runtime entity)
//!
//! A `QuestAlert` is a time-boxed offer broadcast to nearby workers.
//! It counts down from its decision window and ends in exactly one
//! terminal state.
//!
//! # Lifecycle
//!
//! 1. Broadcast → `Broadcasting`, full window remaining
//! 2. Ticks count down; boosts raise the payment
//! 3. Accept / decline / countdown reaches zero → terminal, never left again

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use hustle_types::{Color, urgency_colors};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Remaining-time cutoffs for urgency tiers
pub const CRITICAL_BELOW_SECS: u32 = 15;
pub const ELEVATED_BELOW_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Broadcasting,
    Accepted,
    Declined,
    Expired,
}

impl QuestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Broadcasting)
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Broadcasting => "broadcasting",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
        })
    }
}

/// Presentation tier derived from remaining time. Never gates behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Normal,
    Elevated,
    Critical,
}

impl UrgencyTier {
    pub fn from_remaining(remaining_secs: u32) -> Self {
        if remaining_secs < CRITICAL_BELOW_SECS {
            Self::Critical
        } else if remaining_secs < ELEVATED_BELOW_SECS {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Critical => urgency_colors::CRITICAL,
            Self::Elevated => urgency_colors::ELEVATED,
            Self::Normal => urgency_colors::NORMAL,
        }
    }
}

/// A quest offer and its countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestAlert {
    id: String,
    task_id: String,

    // ─── Timing ─────────────────────────────────────────────────────────────
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    decision_window_secs: u32,
    remaining_secs: u32,
    /// Seconds ticked so far (drives the auto-boost schedule)
    elapsed_secs: u32,

    // ─── Payment (cents) ────────────────────────────────────────────────────
    initial_payment_cents: u64,
    current_payment_cents: u64,
    boost_count: u32,
    /// Subset of `boost_count` applied by the auto-boost schedule
    auto_boost_count: u32,

    status: QuestStatus,
}

impl QuestAlert {
    /// Start broadcasting a quest. The decision window must be non-empty.
    pub fn broadcast(
        id: impl Into<String>,
        task_id: impl Into<String>,
        payment_cents: u64,
        decision_window_secs: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if decision_window_secs == 0 {
            return Err(ConfigurationError::EmptyDecisionWindow { quest_id: id });
        }

        Ok(Self {
            id,
            task_id: task_id.into(),
            created_at,
            expires_at: created_at + Duration::seconds(i64::from(decision_window_secs)),
            decision_window_secs,
            remaining_secs: decision_window_secs,
            elapsed_secs: 0,
            initial_payment_cents: payment_cents,
            current_payment_cents: payment_cents,
            boost_count: 0,
            auto_boost_count: 0,
            status: QuestStatus::Broadcasting,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn decision_window_secs(&self) -> u32 {
        self.decision_window_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn initial_payment_cents(&self) -> u64 {
        self.initial_payment_cents
    }

    pub fn current_payment_cents(&self) -> u64 {
        self.current_payment_cents
    }

    pub fn boost_count(&self) -> u32 {
        self.boost_count
    }

    pub fn auto_boost_count(&self) -> u32 {
        self.auto_boost_count
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn urgency(&self) -> UrgencyTier {
        UrgencyTier::from_remaining(self.remaining_secs)
    }

    /// Fill percentage for the countdown ring (1.0 = full, 0.0 = expired)
    pub fn fill_percent(&self) -> f32 {
        (self.remaining_secs as f32 / self.decision_window_secs as f32).clamp(0.0, 1.0)
    }

    /// Total added by boosts so far
    pub fn boosted_by_cents(&self) -> u64 {
        self.current_payment_cents.saturating_sub(self.initial_payment_cents)
    }

    // ─── Mutation (engine only) ─────────────────────────────────────────────

    /// Advance the countdown, returning the seconds actually consumed
    pub(super) fn advance(&mut self, elapsed_secs: u32) -> u32 {
        let step = elapsed_secs.min(self.remaining_secs);
        self.remaining_secs -= step;
        self.elapsed_secs = self.elapsed_secs.saturating_add(step);
        step
    }

    pub(super) fn add_boost(&mut self, amount_cents: u64, automatic: bool) {
        self.current_payment_cents = self.current_payment_cents.saturating_add(amount_cents);
        self.boost_count += 1;
        if automatic {
            self.auto_boost_count += 1;
        }
    }

    pub(super) fn finish(&mut self, status: QuestStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
    }
}
