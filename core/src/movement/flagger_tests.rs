//! Tests for MovementFlagger
//!
//! Verifies each heuristic, flag deduplication, sample rejection and
//! deterministic replay.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hustle_types::MovementConfig;

use crate::error::{ConfigurationError, InvalidTransitionError, MalformedSampleError};
use crate::events::LiveSignal;
use crate::geo::{Coordinate, GpsSample};

use super::{AppendOutcome, FlagKind, MovementFlagger, MovementSession, SessionStatus};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn origin() -> Coordinate {
    Coordinate::new(47.6062, -122.3321)
}

fn make_flagger() -> MovementFlagger {
    MovementFlagger::new(MovementConfig::default()).unwrap()
}

fn make_session() -> MovementSession {
    MovementSession::start("task-1", "worker-1", t0())
}

/// Accurate sample `meters` north of the origin, `secs` after t0
fn sample(secs: i64, meters: f64) -> GpsSample {
    GpsSample::new(origin().offset_north(meters), t0() + Duration::seconds(secs), 5.0)
}

/// Append every sample, collecting the signals
fn feed(
    flagger: &MovementFlagger,
    session: &mut MovementSession,
    samples: impl IntoIterator<Item = GpsSample>,
) -> Vec<LiveSignal> {
    samples
        .into_iter()
        .flat_map(|s| flagger.append(session, s).unwrap().into_signals())
        .collect()
}

fn raised(signals: &[LiveSignal]) -> Vec<FlagKind> {
    signals
        .iter()
        .filter_map(|s| match s {
            LiveSignal::MovementFlagRaised { flag, .. } => Some(*flag),
            _ => None,
        })
        .collect()
}

/// Ten fixes within a couple of meters of each other, 130 s apart
fn loitering_trail() -> Vec<GpsSample> {
    (0..10).map(|i| sample(i * 130, (i % 3) as f64)).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Heuristics
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_five_km_in_two_seconds_is_impossible_speed() {
    let flagger = make_flagger();
    let mut session = make_session();

    flagger.append(&mut session, sample(0, 0.0)).unwrap();
    let outcome = flagger.append(&mut session, sample(2, 5_000.0)).unwrap();

    match outcome {
        AppendOutcome::Accepted {
            new_flags, segment, ..
        } => {
            assert!(new_flags.contains(&FlagKind::ImpossibleSpeed));
            let segment = segment.unwrap();
            assert!((segment.speed_mps - 2_500.0).abs() < 1e-2);
            assert_eq!(segment.elapsed_secs, 2.0);
        }
        other => panic!("expected accepted sample, got {other:?}"),
    }
    assert_eq!(session.status(), SessionStatus::Suspicious);
    assert!(session.has_flag(FlagKind::ImpossibleSpeed));
}

#[test]
fn test_walking_pace_raises_nothing() {
    let flagger = make_flagger();
    let mut session = make_session();

    // 1.5 m/s for five minutes
    let signals = feed(
        &flagger,
        &mut session,
        (0..30).map(|i| sample(i * 10, i as f64 * 15.0)),
    );

    assert!(raised(&signals).is_empty());
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.flags().count(), 0);
    assert_eq!(session.samples().len(), 30);
}

#[test]
fn test_sub_millisecond_fixes_at_rest_are_not_flagged() {
    let flagger = make_flagger();
    let mut session = make_session();

    let first = GpsSample::new(origin(), t0(), 5.0);
    let second = GpsSample::new(origin(), t0() + Duration::microseconds(500), 5.0);
    let signals = feed(&flagger, &mut session, [first, second]);

    assert!(raised(&signals).is_empty());
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.samples().len(), 2);

    let summary = session.summary();
    assert_eq!(summary.max_speed_mps, 0.0);
    assert!((summary.duration_secs - 0.0005).abs() < 1e-12);

    let json = serde_json::to_string(&session).unwrap();
    let restored: MovementSession = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);
}

#[test]
fn test_sub_millisecond_hop_uses_fractional_elapsed() {
    let flagger = make_flagger();
    let mut session = make_session();

    // 1 m in 0.5 ms is still far beyond any plausible speed, but finite
    let first = GpsSample::new(origin(), t0(), 5.0);
    let second = GpsSample::new(
        origin().offset_north(1.0),
        t0() + Duration::microseconds(500),
        5.0,
    );
    let signals = feed(&flagger, &mut session, [first, second]);

    assert_eq!(raised(&signals), vec![FlagKind::ImpossibleSpeed]);
    let flag = session.flag(FlagKind::ImpossibleSpeed).unwrap();
    assert!(flag.measurement.is_finite());
    assert!((flag.measurement - 2_000.0).abs() < 1.0);
}

#[test]
fn test_location_jump_without_impossible_speed() {
    let flagger = make_flagger();
    let mut session = make_session();

    // 6.5 km in 100 s is 65 m/s: under the speed cap, over the 6 km jump limit
    flagger.append(&mut session, sample(0, 0.0)).unwrap();
    let signals = flagger
        .append(&mut session, sample(100, 6_500.0))
        .unwrap()
        .into_signals();

    assert_eq!(raised(&signals), vec![FlagKind::LocationJump]);
    assert!(!session.has_flag(FlagKind::ImpossibleSpeed));
    assert_eq!(flagger.jump_limit_m(100.0), 6_000.0);
}

#[test]
fn test_ten_samples_within_five_meters_over_twenty_minutes() {
    let flagger = make_flagger();
    let mut session = make_session();

    let signals = feed(&flagger, &mut session, loitering_trail());

    assert_eq!(raised(&signals), vec![FlagKind::StationaryTooLong]);
    let flag = session.flag(FlagKind::StationaryTooLong).unwrap();
    // First qualifies at the 8th fix: 910 s after the first
    assert_eq!(flag.first_detected_at, t0() + Duration::seconds(910));
    assert_eq!(flag.measurement, 910.0);
    assert_eq!(flag.occurrences, 3);
    assert_eq!(flag.peak, 1_170.0);
    assert_eq!(session.status(), SessionStatus::Suspicious);
}

#[test]
fn test_stationary_requires_minimum_samples() {
    let flagger = make_flagger();
    let mut session = make_session();

    // Two fixes 1000 s apart at the same spot: long enough, but too few
    feed(&flagger, &mut session, [sample(0, 0.0), sample(1_000, 1.0)]);
    assert!(!session.has_flag(FlagKind::StationaryTooLong));

    let signals = feed(&flagger, &mut session, [sample(1_100, 2.0)]);
    assert_eq!(raised(&signals), vec![FlagKind::StationaryTooLong]);
}

#[test]
fn test_moving_away_breaks_the_stationary_run() {
    let flagger = make_flagger();
    let mut session = make_session();

    // Dwell 800 s, walk 200 m away, dwell another 800 s
    let trail = [
        sample(0, 0.0),
        sample(400, 1.0),
        sample(800, 2.0),
        sample(900, 200.0),
        sample(1_300, 201.0),
        sample(1_700, 202.0),
    ];
    feed(&flagger, &mut session, trail);

    assert!(!session.has_flag(FlagKind::StationaryTooLong));
}

// ═══════════════════════════════════════════════════════════════════════════
// Deduplication
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_repeated_detection_does_not_duplicate_flags() {
    let flagger = make_flagger();
    let mut session = make_session();

    let trail = [
        sample(0, 0.0),
        sample(2, 5_000.0),
        sample(4, 0.0),
        sample(6, 5_000.0),
    ];
    let signals = feed(&flagger, &mut session, trail);

    let kinds = raised(&signals);
    assert_eq!(
        kinds,
        vec![FlagKind::ImpossibleSpeed, FlagKind::LocationJump]
    );
    assert_eq!(session.flags().count(), 2);

    let speed = session.flag(FlagKind::ImpossibleSpeed).unwrap();
    assert_eq!(speed.occurrences, 3);
    assert_eq!(speed.first_detected_at, t0() + Duration::seconds(2));
    assert_eq!(speed.last_detected_at, t0() + Duration::seconds(6));
}

// ═══════════════════════════════════════════════════════════════════════════
// Malformed Samples
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_coordinate_is_dropped() {
    let flagger = make_flagger();
    let mut session = make_session();
    flagger.append(&mut session, sample(0, 0.0)).unwrap();

    let bad = GpsSample::new(Coordinate::new(f64::NAN, 0.0), t0() + Duration::seconds(5), 5.0);
    let outcome = flagger.append(&mut session, bad).unwrap();

    match &outcome {
        AppendOutcome::Dropped { reason, signals } => {
            assert!(matches!(
                reason,
                MalformedSampleError::InvalidCoordinate { .. }
            ));
            assert!(matches!(signals[0], LiveSignal::SampleDropped { .. }));
        }
        other => panic!("expected drop, got {other:?}"),
    }
    assert_eq!(session.samples().len(), 1);
    assert_eq!(session.dropped_samples(), 1);
    assert_eq!(session.summary().sample_count, 1);
}

#[test]
fn test_bad_accuracy_and_speed_are_dropped() {
    let flagger = make_flagger();
    let mut session = make_session();

    let negative = GpsSample::new(origin(), t0(), -1.0);
    let infinite = GpsSample::new(origin(), t0(), f64::INFINITY);
    let bad_speed = sample(0, 0.0).with_speed(f64::NAN);

    for bad in [negative, infinite, bad_speed] {
        assert!(!flagger.append(&mut session, bad).unwrap().is_accepted());
    }
    assert_eq!(session.dropped_samples(), 3);
    assert!(session.samples().is_empty());
}

#[test]
fn test_non_monotonic_timestamp_is_dropped() {
    let flagger = make_flagger();
    let mut session = make_session();
    flagger.append(&mut session, sample(10, 0.0)).unwrap();

    let duplicate = flagger.append(&mut session, sample(10, 1.0)).unwrap();
    let earlier = flagger.append(&mut session, sample(5, 1.0)).unwrap();

    for outcome in [duplicate, earlier] {
        assert!(matches!(
            outcome,
            AppendOutcome::Dropped {
                reason: MalformedSampleError::NonMonotonicTimestamp { .. },
                ..
            }
        ));
    }
    assert_eq!(session.samples().len(), 1);
    assert_eq!(session.status(), SessionStatus::Active);
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle & Summary
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_completed_session_rejects_appends() {
    let flagger = make_flagger();
    let mut session = make_session();
    feed(&flagger, &mut session, [sample(0, 0.0), sample(2, 5_000.0)]);

    let outcome = flagger.complete(&mut session);
    assert_eq!(outcome.signals.len(), 1);
    assert!(matches!(
        outcome.signals[0],
        LiveSignal::SessionCompleted { .. }
    ));
    assert_eq!(
        outcome.flags,
        vec![FlagKind::ImpossibleSpeed, FlagKind::LocationJump]
    );

    let err = flagger.append(&mut session, sample(10, 0.0)).unwrap_err();
    assert_eq!(
        err,
        InvalidTransitionError::SessionClosed {
            task_id: "task-1".to_string(),
            status: SessionStatus::Completed,
            operation: "append sample",
        }
    );
    assert_eq!(session.samples().len(), 2);
    // Flags outlive completion
    assert!(session.has_flag(FlagKind::LocationJump));
}

#[test]
fn test_complete_twice_is_a_no_op() {
    let flagger = make_flagger();
    let mut session = make_session();

    assert_eq!(flagger.complete(&mut session).signals.len(), 1);
    let again = flagger.complete(&mut session);
    assert!(again.signals.is_empty());
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[test]
fn test_trip_summary_accumulates() {
    let flagger = make_flagger();
    let mut session = make_session();

    feed(
        &flagger,
        &mut session,
        [sample(0, 0.0), sample(10, 100.0), sample(30, 200.0)],
    );

    let summary = session.summary();
    assert_eq!(summary.sample_count, 3);
    assert!((summary.total_distance_m - 200.0).abs() < 1e-2);
    assert_eq!(summary.duration_secs, 30.0);
    assert!((summary.max_speed_mps - 10.0).abs() < 1e-3);
    assert!((summary.average_speed_mps - 200.0 / 30.0).abs() < 1e-3);
}

#[test]
fn test_single_sample_summary_has_no_motion() {
    let flagger = make_flagger();
    let mut session = make_session();
    feed(&flagger, &mut session, [sample(0, 0.0)]);

    let summary = session.summary();
    assert_eq!(summary.sample_count, 1);
    assert_eq!(summary.total_distance_m, 0.0);
    assert_eq!(summary.average_speed_mps, 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Replay & Serialization
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_replay_matches_live_appends() {
    let flagger = make_flagger();
    let mut trail = loitering_trail();
    trail.push(sample(1_300, 5_000.0));

    let mut live = make_session();
    feed(&flagger, &mut live, trail.clone());

    let replayed = flagger.replay("task-1", "worker-1", t0(), trail.clone());
    let again = flagger.replay("task-1", "worker-1", t0(), trail);

    assert_eq!(replayed, live);
    assert_eq!(replayed, again);
}

#[test]
fn test_session_round_trips_through_json() {
    let flagger = make_flagger();
    let mut session = make_session();
    feed(&flagger, &mut session, loitering_trail());

    let json = serde_json::to_string(&session).unwrap();
    let restored: MovementSession = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);

    // Restored sessions keep flagging from where they left off
    let mut restored = restored;
    let signals = feed(&flagger, &mut restored, [sample(1_200, 5_000.0)]);
    assert!(raised(&signals).contains(&FlagKind::LocationJump));
    assert_eq!(
        restored.flag(FlagKind::StationaryTooLong).unwrap().occurrences,
        3
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_thresholds_are_rejected() {
    let config = MovementConfig {
        max_speed_mps: 0.0,
        ..MovementConfig::default()
    };
    assert!(matches!(
        MovementFlagger::new(config),
        Err(ConfigurationError::InvalidThreshold { .. })
    ));

    let config = MovementConfig {
        stationary_radius_m: f64::NAN,
        ..MovementConfig::default()
    };
    assert!(MovementFlagger::new(config).is_err());
}
