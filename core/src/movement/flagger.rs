//! Movement flagger
//!
//! Appends samples to a `MovementSession` and checks the trail for
//! implausible motion after each append. Detection is deterministic: the
//! same samples in the same order always produce the same flags.

use chrono::{DateTime, Utc};
use hustle_types::MovementConfig;

use crate::context::validate_movement;
use crate::error::{ConfigurationError, InvalidTransitionError, MalformedSampleError};
use crate::events::LiveSignal;
use crate::geo::GpsSample;

use super::session::seconds_between;
use super::{FlagKind, MovementSession, Segment, TripSummary};

/// Result of appending one sample
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Accepted {
        /// Flag kinds raised for the first time by this sample
        new_flags: Vec<FlagKind>,
        /// Motion from the previous sample (`None` for the first one)
        segment: Option<Segment>,
        signals: Vec<LiveSignal>,
    },
    /// Sample rejected; the session is unchanged apart from its drop counter
    Dropped {
        reason: MalformedSampleError,
        signals: Vec<LiveSignal>,
    },
}

impl AppendOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn signals(&self) -> &[LiveSignal] {
        match self {
            Self::Accepted { signals, .. } | Self::Dropped { signals, .. } => signals,
        }
    }

    pub fn into_signals(self) -> Vec<LiveSignal> {
        match self {
            Self::Accepted { signals, .. } | Self::Dropped { signals, .. } => signals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub summary: TripSummary,
    pub flags: Vec<FlagKind>,
    /// Empty when the session was already completed
    pub signals: Vec<LiveSignal>,
}

/// Fraud heuristics over a worker's GPS trail
#[derive(Debug, Clone)]
pub struct MovementFlagger {
    config: MovementConfig,
}

impl MovementFlagger {
    pub fn new(config: MovementConfig) -> Result<Self, ConfigurationError> {
        validate_movement(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Append
    // ═══════════════════════════════════════════════════════════════════════

    /// Append a sample and re-run detection.
    ///
    /// Malformed samples are dropped and counted, never stored. Each flag
    /// kind is reported once per session; later detections only bump the
    /// existing flag.
    pub fn append(
        &self,
        session: &mut MovementSession,
        sample: GpsSample,
    ) -> Result<AppendOutcome, InvalidTransitionError> {
        if session.is_completed() {
            return Err(InvalidTransitionError::SessionClosed {
                task_id: session.task_id().to_string(),
                status: session.status(),
                operation: "append sample",
            });
        }

        if let Err(reason) = Self::check_sample(session, &sample) {
            session.record_drop();
            tracing::warn!(
                task_id = session.task_id(),
                worker_id = session.worker_id(),
                dropped = session.dropped_samples(),
                "Dropped GPS sample: {reason}"
            );
            let signal = LiveSignal::SampleDropped {
                task_id: session.task_id().to_string(),
                worker_id: session.worker_id().to_string(),
                reason: reason.clone(),
            };
            return Ok(AppendOutcome::Dropped {
                reason,
                signals: vec![signal],
            });
        }

        let segment = session
            .last_sample()
            .map(|previous| Segment::between(previous, &sample));
        session.push_sample(sample, segment.as_ref());

        let mut detected = Vec::new();
        if let Some(segment) = &segment {
            if segment.speed_mps > self.config.max_speed_mps {
                detected.push((FlagKind::ImpossibleSpeed, segment.speed_mps));
            }
            if segment.distance_m > self.jump_limit_m(segment.elapsed_secs) {
                detected.push((FlagKind::LocationJump, segment.distance_m));
            }
        }
        if let Some(dwell_secs) = self.stationary_dwell_secs(session.samples()) {
            detected.push((FlagKind::StationaryTooLong, dwell_secs));
        }

        let mut new_flags = Vec::new();
        let mut signals = Vec::new();
        for (kind, measurement) in detected {
            if !session.record_flag(kind, sample.timestamp, measurement) {
                continue;
            }
            tracing::info!(
                task_id = session.task_id(),
                worker_id = session.worker_id(),
                flag = kind.label(),
                measurement,
                unit = kind.unit(),
                "Movement flag raised"
            );
            new_flags.push(kind);
            signals.push(LiveSignal::MovementFlagRaised {
                task_id: session.task_id().to_string(),
                worker_id: session.worker_id().to_string(),
                flag: kind,
                timestamp: sample.timestamp,
            });
        }
        session.refresh_status();

        Ok(AppendOutcome::Accepted {
            new_flags,
            segment,
            signals,
        })
    }

    /// Largest displacement still plausible after `elapsed_secs`
    pub fn jump_limit_m(&self, elapsed_secs: f64) -> f64 {
        self.config.jump_allowance_m + self.config.jump_speed_bound_mps * elapsed_secs
    }

    fn check_sample(
        session: &MovementSession,
        sample: &GpsSample,
    ) -> Result<(), MalformedSampleError> {
        if !sample.coordinate.is_valid() {
            return Err(MalformedSampleError::InvalidCoordinate {
                latitude: sample.coordinate.latitude,
                longitude: sample.coordinate.longitude,
            });
        }
        if !sample.accuracy_m.is_finite() || sample.accuracy_m < 0.0 {
            return Err(MalformedSampleError::InvalidAccuracy {
                accuracy_m: sample.accuracy_m,
            });
        }
        if let Some(speed_mps) = sample.speed_mps
            && (!speed_mps.is_finite() || speed_mps < 0.0)
        {
            return Err(MalformedSampleError::InvalidSpeed { speed_mps });
        }
        if let Some(previous) = session.last_sample()
            && sample.timestamp <= previous.timestamp
        {
            return Err(MalformedSampleError::NonMonotonicTimestamp {
                previous: previous.timestamp,
                timestamp: sample.timestamp,
            });
        }
        Ok(())
    }

    /// Dwell of the trailing run of samples within the stationary radius of
    /// the latest fix, if that run is long enough to flag.
    fn stationary_dwell_secs(&self, samples: &[GpsSample]) -> Option<f64> {
        let (latest, earlier) = samples.split_last()?;
        let min_samples = self.config.stationary_min_samples.max(1);
        let min_dwell = f64::from(self.config.stationary_duration_secs);

        let mut count = 1;
        let mut run_start = latest.timestamp;
        for sample in earlier.iter().rev() {
            if sample.distance_to(latest) > self.config.stationary_radius_m {
                break;
            }
            count += 1;
            run_start = sample.timestamp;
        }

        let dwell = seconds_between(run_start, latest.timestamp);
        (count >= min_samples && dwell >= min_dwell).then_some(dwell)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Close the session. Completing twice is a no-op.
    pub fn complete(&self, session: &mut MovementSession) -> CompletionOutcome {
        let mut signals = Vec::new();
        if !session.is_completed() {
            session.mark_completed();
            tracing::info!(
                task_id = session.task_id(),
                worker_id = session.worker_id(),
                samples = session.summary().sample_count,
                flags = ?session.flag_kinds(),
                "Movement session completed"
            );
            signals.push(LiveSignal::SessionCompleted {
                task_id: session.task_id().to_string(),
                worker_id: session.worker_id().to_string(),
                summary: session.summary().clone(),
            });
        }

        CompletionOutcome {
            summary: session.summary().clone(),
            flags: session.flag_kinds(),
            signals,
        }
    }

    /// Rebuild a session from a recorded trail. Replaying the same samples
    /// always yields an identical session.
    pub fn replay(
        &self,
        task_id: impl Into<String>,
        worker_id: impl Into<String>,
        started_at: DateTime<Utc>,
        samples: impl IntoIterator<Item = GpsSample>,
    ) -> MovementSession {
        let mut session = MovementSession::start(task_id, worker_id, started_at);
        for sample in samples {
            // A fresh session is never completed, so append cannot fail here
            if let Err(err) = self.append(&mut session, sample) {
                tracing::error!("Replay stopped: {err}");
                break;
            }
        }
        session
    }
}
