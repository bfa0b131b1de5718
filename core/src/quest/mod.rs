//! Quest offer system
//!
//! This module provides:
//! - **Alerts**: the runtime state of a broadcast quest offer
//! - **Engine**: countdown, price boosts and the accept/decline/expire state machine
//! - **Urgency tiers**: presentation hints derived from remaining time

mod alert;
mod engine;


pub use alert::{CRITICAL_BELOW_SECS, ELEVATED_BELOW_SECS, QuestAlert, QuestStatus, UrgencyTier};
pub use engine::{
    BoostOutcome, DecisionOutcome, DriveOutcome, QuestUrgencyEngine, TickOutcome, Transition,
};
