//! Quest countdown and pricing engine
//!
//! Drives `QuestAlert`s through `broadcasting → {accepted, declined, expired}`.
//! The engine holds only configuration; every mutation goes through the
//! alert passed in, and time only moves when the caller ticks it.

use chrono::{DateTime, Utc};
use hustle_types::{AutoBoostConfig, QuestConfig};

use crate::clock::TickSource;
use crate::context::validate_quest;
use crate::error::{ConfigurationError, InvalidTransitionError};
use crate::events::LiveSignal;

use super::{QuestAlert, QuestStatus, UrgencyTier};

/// Result of a terminal decision call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The alert moved into this terminal state
    Applied(QuestStatus),
    /// The alert was already in this state; nothing changed
    Unchanged(QuestStatus),
}

impl Transition {
    pub fn status(&self) -> QuestStatus {
        match self {
            Self::Applied(status) | Self::Unchanged(status) => *status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub transition: Transition,
    pub signals: Vec<LiveSignal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub remaining_secs: u32,
    pub status: QuestStatus,
    pub urgency: UrgencyTier,
    /// Auto boosts and expiry produced by this tick
    pub signals: Vec<LiveSignal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoostOutcome {
    pub current_payment_cents: u64,
    pub boost_count: u32,
    pub signals: Vec<LiveSignal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriveOutcome {
    /// Ticks consumed from the source
    pub ticks: usize,
    pub status: QuestStatus,
    pub remaining_secs: u32,
    pub signals: Vec<LiveSignal>,
}

/// Countdown, boost and decision logic for quest offers
#[derive(Debug, Clone)]
pub struct QuestUrgencyEngine {
    config: QuestConfig,
}

impl QuestUrgencyEngine {
    pub fn new(config: QuestConfig) -> Result<Self, ConfigurationError> {
        validate_quest(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    /// Broadcast a quest using the configured decision window
    pub fn broadcast(
        &self,
        id: impl Into<String>,
        task_id: impl Into<String>,
        payment_cents: u64,
        created_at: DateTime<Utc>,
    ) -> Result<QuestAlert, ConfigurationError> {
        QuestAlert::broadcast(
            id,
            task_id,
            payment_cents,
            self.config.decision_window_secs,
            created_at,
        )
    }

    // ─── Countdown ──────────────────────────────────────────────────────────

    /// Count down by `elapsed_secs`. Expires the alert when nothing remains.
    ///
    /// Auto boosts are scheduled on cumulative broadcast time, so the result
    /// is the same whether time arrives as one large tick or many small ones.
    pub fn tick(
        &self,
        alert: &mut QuestAlert,
        elapsed_secs: u32,
    ) -> Result<TickOutcome, InvalidTransitionError> {
        self.ensure_broadcasting(alert, "tick")?;

        let mut signals = Vec::new();
        alert.advance(elapsed_secs);

        if let Some(schedule) = &self.config.auto_boost {
            self.apply_due_auto_boosts(alert, schedule, &mut signals);
        }

        if alert.remaining_secs() == 0 {
            alert.finish(QuestStatus::Expired);
            tracing::info!(
                quest_id = alert.id(),
                payment_cents = alert.current_payment_cents(),
                boosts = alert.boost_count(),
                "Quest expired"
            );
            signals.push(LiveSignal::QuestExpired {
                quest_id: alert.id().to_string(),
                task_id: alert.task_id().to_string(),
                final_payment_cents: alert.current_payment_cents(),
                elapsed_secs: alert.elapsed_secs(),
            });
        }

        Ok(TickOutcome {
            remaining_secs: alert.remaining_secs(),
            status: alert.status(),
            urgency: alert.urgency(),
            signals,
        })
    }

    /// Drain a tick source into the alert, stopping at the first terminal state.
    /// Ticks left in the source after expiry stay queued.
    pub fn drive(
        &self,
        alert: &mut QuestAlert,
        ticker: &mut impl TickSource,
    ) -> Result<DriveOutcome, InvalidTransitionError> {
        self.ensure_broadcasting(alert, "drive")?;

        let mut ticks = 0;
        let mut signals = Vec::new();
        while !alert.is_terminal() {
            let Some(elapsed) = ticker.next_tick() else {
                break;
            };
            ticks += 1;
            signals.extend(self.tick(alert, elapsed)?.signals);
        }

        Ok(DriveOutcome {
            ticks,
            status: alert.status(),
            remaining_secs: alert.remaining_secs(),
            signals,
        })
    }

    /// Catch the countdown up to a clock reading (e.g. after the host was
    /// suspended). Never moves the countdown backwards.
    pub fn sync_to(
        &self,
        alert: &mut QuestAlert,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, InvalidTransitionError> {
        let since_created = now
            .signed_duration_since(alert.created_at())
            .num_seconds()
            .max(0);
        let target = u32::try_from(since_created).unwrap_or(u32::MAX);
        let behind = target.saturating_sub(alert.elapsed_secs());
        self.tick(alert, behind)
    }

    // ─── Pricing ────────────────────────────────────────────────────────────

    /// Raise the payment of a broadcasting quest
    pub fn apply_boost(
        &self,
        alert: &mut QuestAlert,
        boost_cents: u64,
    ) -> Result<BoostOutcome, InvalidTransitionError> {
        self.ensure_broadcasting(alert, "apply boost")?;
        if boost_cents == 0 {
            return Err(InvalidTransitionError::EmptyBoost {
                quest_id: alert.id().to_string(),
            });
        }

        let signal = Self::boost(alert, boost_cents, false);
        Ok(BoostOutcome {
            current_payment_cents: alert.current_payment_cents(),
            boost_count: alert.boost_count(),
            signals: vec![signal],
        })
    }

    fn apply_due_auto_boosts(
        &self,
        alert: &mut QuestAlert,
        schedule: &AutoBoostConfig,
        signals: &mut Vec<LiveSignal>,
    ) {
        // A boost due at the instant of expiry never lands
        let last_live_second = alert
            .elapsed_secs()
            .min(alert.decision_window_secs().saturating_sub(1));
        let due = (last_live_second / schedule.interval_secs).min(schedule.max_boosts);
        while alert.auto_boost_count() < due {
            signals.push(Self::boost(alert, schedule.amount_cents, true));
        }
    }

    fn boost(alert: &mut QuestAlert, amount_cents: u64, automatic: bool) -> LiveSignal {
        alert.add_boost(amount_cents, automatic);
        tracing::info!(
            quest_id = alert.id(),
            boost_cents = amount_cents,
            payment_cents = alert.current_payment_cents(),
            boost_count = alert.boost_count(),
            automatic,
            "Price boost applied"
        );
        LiveSignal::PriceBoostApplied {
            quest_id: alert.id().to_string(),
            task_id: alert.task_id().to_string(),
            boost_cents: amount_cents,
            current_payment_cents: alert.current_payment_cents(),
            boost_count: alert.boost_count(),
            automatic,
        }
    }

    // ─── Decisions ──────────────────────────────────────────────────────────

    pub fn accept(&self, alert: &mut QuestAlert) -> Result<DecisionOutcome, InvalidTransitionError> {
        self.decide(alert, QuestStatus::Accepted, "accept")
    }

    pub fn decline(
        &self,
        alert: &mut QuestAlert,
    ) -> Result<DecisionOutcome, InvalidTransitionError> {
        self.decide(alert, QuestStatus::Declined, "decline")
    }

    /// External cancellation: the host withdraws the offer. Ends as `Expired`.
    pub fn cancel(&self, alert: &mut QuestAlert) -> Result<DecisionOutcome, InvalidTransitionError> {
        self.decide(alert, QuestStatus::Expired, "cancel")
    }

    fn decide(
        &self,
        alert: &mut QuestAlert,
        target: QuestStatus,
        operation: &'static str,
    ) -> Result<DecisionOutcome, InvalidTransitionError> {
        if alert.status() == target {
            return Ok(DecisionOutcome {
                transition: Transition::Unchanged(target),
                signals: Vec::new(),
            });
        }
        self.ensure_broadcasting(alert, operation)?;

        alert.finish(target);
        tracing::debug!(quest_id = alert.id(), status = %target, "Quest decided");

        let quest_id = alert.id().to_string();
        let task_id = alert.task_id().to_string();
        let signal = match target {
            QuestStatus::Accepted => LiveSignal::QuestAccepted {
                quest_id,
                task_id,
                payment_cents: alert.current_payment_cents(),
                remaining_secs: alert.remaining_secs(),
            },
            QuestStatus::Declined => LiveSignal::QuestDeclined {
                quest_id,
                task_id,
                remaining_secs: alert.remaining_secs(),
            },
            QuestStatus::Expired | QuestStatus::Broadcasting => LiveSignal::QuestExpired {
                quest_id,
                task_id,
                final_payment_cents: alert.current_payment_cents(),
                elapsed_secs: alert.elapsed_secs(),
            },
        };

        Ok(DecisionOutcome {
            transition: Transition::Applied(target),
            signals: vec![signal],
        })
    }

    fn ensure_broadcasting(
        &self,
        alert: &QuestAlert,
        operation: &'static str,
    ) -> Result<(), InvalidTransitionError> {
        if alert.is_terminal() {
            tracing::debug!(quest_id = alert.id(), status = %alert.status(), operation, "Ignored on terminal quest");
            return Err(InvalidTransitionError::QuestTerminal {
                quest_id: alert.id().to_string(),
                status: alert.status(),
                operation,
            });
        }
        Ok(())
    }
}
