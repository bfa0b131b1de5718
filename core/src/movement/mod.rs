//! Worker movement tracking
//!
//! This module provides:
//! - **Sessions**: the append-only GPS trail of a worker on a task
//! - **Flagger**: speed, jump and dwell heuristics run on every append
//! - **Trip summary**: running distance and speed statistics

mod flagger;
mod session;

#[cfg(test)]
mod flagger_tests;

pub use flagger::{AppendOutcome, CompletionOutcome, MovementFlagger};
pub use session::{
    FlagKind, MovementFlag, MovementSession, Segment, SessionStatus, TripSummary,
};
