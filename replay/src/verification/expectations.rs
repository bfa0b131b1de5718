//! Scenario outcome verification
//!
//! The `[expect]` table of a scenario lists the outcomes a replay must
//! reproduce. Signals are tallied as they are emitted; the final entity
//! states are compared once the timeline is exhausted.

use serde::Deserialize;

use hustle_core::{FlagKind, LiveSignal, QuestStatus, SessionStatus};

/// Expected outcomes. Every field is optional; only listed ones are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expectations {
    /// Number of Smart Start triggers
    #[serde(default)]
    pub smart_starts: Option<u32>,

    /// Flag kinds raised, in any order
    #[serde(default)]
    pub flags: Option<Vec<FlagKind>>,

    #[serde(default)]
    pub dropped_samples: Option<u32>,

    #[serde(default)]
    pub session_status: Option<SessionStatus>,

    #[serde(default)]
    pub quest_status: Option<QuestStatus>,

    /// Total boosts applied (manual and automatic)
    #[serde(default)]
    pub boosts: Option<u32>,

    #[serde(default)]
    pub final_payment_cents: Option<u64>,
}

/// Entity state at the end of a replay
#[derive(Debug, Clone, PartialEq)]
pub struct FinalState {
    pub session_status: SessionStatus,
    pub dropped_samples: u32,
    pub quest_status: Option<QuestStatus>,
    pub payment_cents: Option<u64>,
}

/// Overall verification result
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub checks_passed: u32,
    pub checks_total: u32,
    pub failures: Vec<String>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.checks_passed == self.checks_total
    }
}

/// Tallies emitted signals and checks them against expectations
#[derive(Debug)]
pub struct ScenarioVerifier {
    expectations: Expectations,
    smart_starts: u32,
    boosts: u32,
    flags_raised: Vec<FlagKind>,
}

impl ScenarioVerifier {
    pub fn new(expectations: Expectations) -> Self {
        Self {
            expectations,
            smart_starts: 0,
            boosts: 0,
            flags_raised: Vec::new(),
        }
    }

    pub fn record_signal(&mut self, signal: &LiveSignal) {
        match signal {
            LiveSignal::SmartStartTriggered { .. } => self.smart_starts += 1,
            LiveSignal::PriceBoostApplied { .. } => self.boosts += 1,
            LiveSignal::MovementFlagRaised { flag, .. } => self.flags_raised.push(*flag),
            _ => {}
        }
    }

    /// Compare tallies and final state against the expectations
    pub fn finalize(self, state: &FinalState) -> VerificationResult {
        let exp = &self.expectations;
        let mut total = 0;
        let mut failures = Vec::new();

        let mut check = |ok: bool, failure: String| {
            total += 1;
            if !ok {
                failures.push(failure);
            }
        };

        if let Some(expected) = exp.smart_starts {
            check(
                self.smart_starts == expected,
                format!(
                    "expected {expected} Smart Start trigger(s), saw {}",
                    self.smart_starts
                ),
            );
        }

        if let Some(expected) = &exp.flags {
            let mut expected = expected.clone();
            expected.sort();
            let mut actual = self.flags_raised.clone();
            actual.sort();
            check(
                actual == expected,
                format!("expected flags {expected:?}, raised {actual:?}"),
            );
        }

        if let Some(expected) = exp.dropped_samples {
            check(
                state.dropped_samples == expected,
                format!(
                    "expected {expected} dropped sample(s), saw {}",
                    state.dropped_samples
                ),
            );
        }

        if let Some(expected) = exp.session_status {
            check(
                state.session_status == expected,
                format!(
                    "expected session status {expected}, got {}",
                    state.session_status
                ),
            );
        }

        if let Some(expected) = exp.quest_status {
            check(
                state.quest_status == Some(expected),
                format!(
                    "expected quest status {expected}, got {}",
                    describe(state.quest_status)
                ),
            );
        }

        if let Some(expected) = exp.boosts {
            check(
                self.boosts == expected,
                format!("expected {expected} boost(s), saw {}", self.boosts),
            );
        }

        if let Some(expected) = exp.final_payment_cents {
            check(
                state.payment_cents == Some(expected),
                format!(
                    "expected final payment {expected} cents, got {}",
                    describe(state.payment_cents)
                ),
            );
        }

        let checks_total = total;
        let checks_passed = checks_total - failures.len() as u32;
        VerificationResult {
            checks_passed,
            checks_total,
            failures,
        }
    }
}

fn describe<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "no quest".to_string(), |v| v.to_string())
}
