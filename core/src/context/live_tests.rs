//! Tests for LiveContext
//!
//! Verifies signal fan-out to handlers and the task lifecycle hooks.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hustle_types::{AutoBoostConfig, EngineConfig};

use crate::clock::{ChannelTicker, ManualClock, ManualTicker};
use crate::error::{ConfigurationError, InvalidTransitionError};
use crate::events::{LiveSignal, SignalHandler};
use crate::geo::{Coordinate, GpsSample};
use crate::geofence::{GeofenceRegion, GeofenceWatch};
use crate::movement::{FlagKind, MovementSession, SessionStatus};
use crate::quest::QuestStatus;

use super::LiveContext;

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Everything a handler observed, shared with the test body
#[derive(Debug, Default)]
struct Observed {
    signals: Vec<LiveSignal>,
    started: Vec<String>,
    ended: Vec<String>,
}

struct SharedHandler(Rc<RefCell<Observed>>);

impl SignalHandler for SharedHandler {
    fn handle_signal(&mut self, signal: &LiveSignal) {
        self.0.borrow_mut().signals.push(signal.clone());
    }

    fn on_session_start(&mut self, task_id: &str) {
        self.0.borrow_mut().started.push(task_id.to_string());
    }

    fn on_session_end(&mut self, task_id: &str) {
        self.0.borrow_mut().ended.push(task_id.to_string());
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

fn site() -> Coordinate {
    Coordinate::new(34.0522, -118.2437)
}

fn make_context() -> (LiveContext, Rc<RefCell<Observed>>) {
    let observed = Rc::new(RefCell::new(Observed::default()));
    let mut context = LiveContext::new(EngineConfig::default()).unwrap();
    context.register_handler(Box::new(SharedHandler(Rc::clone(&observed))));
    (context, observed)
}

fn make_watch() -> GeofenceWatch {
    GeofenceWatch::new(GeofenceRegion::new("fence-1", "task-1", site(), 150.0, t0()).unwrap())
}

fn fix(secs: i64, meters_from_site: f64) -> GpsSample {
    GpsSample::new(site().offset_north(meters_from_site), at(secs), 8.0)
}

fn labels(observed: &Rc<RefCell<Observed>>) -> Vec<&'static str> {
    observed.borrow().signals.iter().map(|s| s.label()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_config_fails_construction() {
    let mut config = EngineConfig::default();
    config.movement.stationary_radius_m = 0.0;
    assert!(matches!(
        LiveContext::new(config),
        Err(ConfigurationError::InvalidThreshold { .. })
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// Location Routing
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_approach_fires_smart_start_once() {
    let (mut context, observed) = make_context();
    let mut watch = make_watch();
    let mut session = MovementSession::start("task-1", "worker-1", t0());

    // Walk in from 400 m at ~1.4 m/s, then linger inside
    for (i, distance) in [400.0, 260.0, 120.0, 40.0, 10.0].into_iter().enumerate() {
        let secs = i as i64 * 100;
        let update = context.on_location(&mut watch, &mut session, fix(secs, distance), at(secs));
        assert!(update.reading.is_ok());
        assert!(update.movement.unwrap().is_accepted());
    }

    assert_eq!(labels(&observed), vec!["smart_start"]);
    assert_eq!(watch.entries(), 1);
    assert_eq!(session.samples().len(), 5);
    assert_eq!(session.status(), SessionStatus::Active);
}

#[test]
fn test_location_results_are_independent() {
    let (mut context, observed) = make_context();
    let mut watch = make_watch();
    watch.region_mut().deactivate();
    let mut session = MovementSession::start("task-1", "worker-1", t0());

    let update = context.on_location(&mut watch, &mut session, fix(0, 0.0), at(0));

    assert!(matches!(
        update.reading,
        Err(InvalidTransitionError::RegionInactive { .. })
    ));
    assert!(update.movement.is_ok());
    assert_eq!(session.samples().len(), 1);
    assert!(observed.borrow().signals.is_empty());
}

#[test]
fn test_movement_flags_and_drops_reach_handlers() {
    let (mut context, observed) = make_context();
    let mut session = MovementSession::start("task-1", "worker-1", t0());

    context.on_movement_sample(&mut session, fix(0, 0.0)).unwrap();
    context.on_movement_sample(&mut session, fix(0, 5.0)).unwrap();
    context.on_movement_sample(&mut session, fix(2, 5_000.0)).unwrap();

    assert_eq!(
        labels(&observed),
        vec!["sample_dropped", "movement_flag", "movement_flag"]
    );
    assert!(session.has_flag(FlagKind::ImpossibleSpeed));

    let outcome = context.complete_session(&mut session);
    assert_eq!(outcome.summary.sample_count, 2);
    assert_eq!(labels(&observed).last(), Some(&"session_completed"));

    let err = context.on_movement_sample(&mut session, fix(5, 0.0));
    assert!(err.is_err());
}

// ═══════════════════════════════════════════════════════════════════════════
// Quest Routing
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_quest_actions_are_dispatched() {
    let (mut context, observed) = make_context();
    let mut alert = context.quests().broadcast("quest-1", "task-1", 2_000, t0()).unwrap();

    context.on_quest_tick(&mut alert, 10).unwrap();
    context.boost_quest(&mut alert, 500).unwrap();
    context.accept_quest(&mut alert).unwrap();

    assert_eq!(labels(&observed), vec!["price_boost", "quest_accepted"]);
    assert_eq!(alert.status(), QuestStatus::Accepted);

    // Terminal quests reject further actions without reaching handlers
    assert!(context.decline_quest(&mut alert).is_err());
    assert!(context.boost_quest(&mut alert, 100).is_err());
    assert_eq!(observed.borrow().signals.len(), 2);
}

#[test]
fn test_drive_to_expiry_with_auto_boosts() {
    let mut config = EngineConfig::default();
    config.quest.auto_boost = Some(AutoBoostConfig {
        interval_secs: 20,
        amount_cents: 250,
        max_boosts: 3,
    });
    let observed = Rc::new(RefCell::new(Observed::default()));
    let mut context = LiveContext::new(config).unwrap();
    context.register_handler(Box::new(SharedHandler(Rc::clone(&observed))));

    let mut alert = context.quests().broadcast("quest-1", "task-1", 2_000, t0()).unwrap();
    let mut ticker = ManualTicker::seconds(120);
    let outcome = context.on_quest_drive(&mut alert, &mut ticker).unwrap();

    assert_eq!(outcome.status, QuestStatus::Expired);
    assert_eq!(outcome.ticks, 60);
    assert_eq!(ticker.remaining(), 60);
    // Boosts at 20 s and 40 s; the one due at 60 s coincides with expiry
    assert_eq!(
        labels(&observed),
        vec!["price_boost", "price_boost", "quest_expired"]
    );
    assert_eq!(alert.current_payment_cents(), 2_500);
}

#[test]
fn test_channel_driven_countdown() {
    let (mut context, observed) = make_context();
    let mut alert = context.quests().broadcast("quest-1", "task-1", 1_500, t0()).unwrap();
    let (sender, mut ticker) = ChannelTicker::channel();

    for _ in 0..3 {
        assert!(sender.tick(20));
    }
    let outcome = context.on_quest_drive(&mut alert, &mut ticker).unwrap();

    assert_eq!(outcome.status, QuestStatus::Expired);
    assert_eq!(labels(&observed), vec!["quest_expired"]);
}

#[test]
fn test_sync_quest_catches_up_to_clock() {
    let (mut context, observed) = make_context();
    let mut alert = context.quests().broadcast("quest-1", "task-1", 1_500, t0()).unwrap();
    let clock = ManualClock::new(t0());

    clock.advance_secs(45);
    let outcome = context.sync_quest(&mut alert, &clock).unwrap();
    assert_eq!(outcome.remaining_secs, 15);
    assert!(observed.borrow().signals.is_empty());

    clock.advance_secs(30);
    let outcome = context.sync_quest(&mut alert, &clock).unwrap();
    assert_eq!(outcome.status, QuestStatus::Expired);
    assert_eq!(labels(&observed), vec!["quest_expired"]);
}

#[test]
fn test_cancel_quest_expires_offer() {
    let (mut context, observed) = make_context();
    let mut alert = context.quests().broadcast("quest-1", "task-1", 1_500, t0()).unwrap();

    context.cancel_quest(&mut alert).unwrap();
    assert_eq!(alert.status(), QuestStatus::Expired);
    assert_eq!(labels(&observed), vec!["quest_expired"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle Hooks
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_task_hooks_and_shutdown() {
    let (mut context, observed) = make_context();

    context.begin_task("task-1");
    context.begin_task("task-1");
    context.begin_task("task-2");
    context.end_task("task-1");
    context.end_task("task-unknown");
    assert_eq!(context.open_tasks(), ["task-2".to_string()]);

    context.shutdown();

    let observed = observed.borrow();
    assert_eq!(observed.started, vec!["task-1", "task-2"]);
    assert_eq!(observed.ended, vec!["task-1", "task-2"]);
}

#[test]
fn test_every_handler_sees_every_signal() {
    let (mut context, first) = make_context();
    let second = Rc::new(RefCell::new(Observed::default()));
    context.register_handler(Box::new(SharedHandler(Rc::clone(&second))));
    assert_eq!(context.handler_count(), 2);

    let mut alert = context.quests().broadcast("quest-1", "task-1", 1_000, t0()).unwrap();
    context.decline_quest(&mut alert).unwrap();

    assert_eq!(first.borrow().signals, second.borrow().signals);
    assert_eq!(labels(&second), vec!["quest_declined"]);
}
