//! Outcome verification for scenario replays
//!
//! Checks emitted signals and final entity state against a scenario's `[expect]` table.

pub mod expectations;

pub use expectations::{Expectations, FinalState, ScenarioVerifier, VerificationResult};
