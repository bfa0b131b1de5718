//! LIVE-mode context
//!
//! Owns the three engines and the registered signal handlers. Hosts create
//! one context and route location fixes, quest ticks and quest actions
//! through it; every signal an engine produces is forwarded to each handler
//! in registration order.

use std::path::Path;

use chrono::{DateTime, Utc};
use hustle_types::EngineConfig;

use super::{ConfigError, EngineConfigExt};
use crate::clock::{Clock, TickSource};
use crate::error::{ConfigurationError, InvalidTransitionError};
use crate::events::{LiveSignal, SignalHandler};
use crate::geo::GpsSample;
use crate::geofence::{GeofenceEvaluator, GeofenceReading, GeofenceWatch};
use crate::movement::{AppendOutcome, CompletionOutcome, MovementFlagger, MovementSession};
use crate::quest::{
    BoostOutcome, DecisionOutcome, DriveOutcome, QuestAlert, QuestUrgencyEngine, TickOutcome,
};

/// Result of routing one location fix to both location consumers
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub reading: Result<GeofenceReading, InvalidTransitionError>,
    pub movement: Result<AppendOutcome, InvalidTransitionError>,
}

pub struct LiveContext {
    geofence: GeofenceEvaluator,
    quests: QuestUrgencyEngine,
    movement: MovementFlagger,
    handlers: Vec<Box<dyn SignalHandler>>,
    /// Tasks announced to handlers and not yet ended
    open_tasks: Vec<String>,
}

impl LiveContext {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        let context = Self {
            geofence: GeofenceEvaluator::new(config.geofence)?,
            quests: QuestUrgencyEngine::new(config.quest)?,
            movement: MovementFlagger::new(config.movement)?,
            handlers: Vec::new(),
            open_tasks: Vec::new(),
        };
        tracing::debug!("LIVE context initialized");
        Ok(context)
    }

    /// Build from a TOML config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = EngineConfig::load_from_path(path)?;
        Ok(Self::new(config)?)
    }

    pub fn geofence(&self) -> &GeofenceEvaluator {
        &self.geofence
    }

    pub fn quests(&self) -> &QuestUrgencyEngine {
        &self.quests
    }

    pub fn movement(&self) -> &MovementFlagger {
        &self.movement
    }

    pub fn register_handler(&mut self, handler: Box<dyn SignalHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    // ─── Task lifecycle ─────────────────────────────────────────────────────

    /// Announce a task to the handlers. Repeated calls for an open task are ignored.
    pub fn begin_task(&mut self, task_id: &str) {
        if self.open_tasks.iter().any(|t| t == task_id) {
            return;
        }
        self.open_tasks.push(task_id.to_string());
        for handler in &mut self.handlers {
            handler.on_session_start(task_id);
        }
    }

    pub fn end_task(&mut self, task_id: &str) {
        let Some(pos) = self.open_tasks.iter().position(|t| t == task_id) else {
            return;
        };
        self.open_tasks.remove(pos);
        for handler in &mut self.handlers {
            handler.on_session_end(task_id);
        }
    }

    pub fn open_tasks(&self) -> &[String] {
        &self.open_tasks
    }

    /// End every open task and drop the handlers
    pub fn shutdown(mut self) {
        for task_id in std::mem::take(&mut self.open_tasks) {
            for handler in &mut self.handlers {
                handler.on_session_end(&task_id);
            }
        }
        tracing::debug!(handlers = self.handlers.len(), "LIVE context shut down");
    }

    // ─── Location ───────────────────────────────────────────────────────────

    /// Feed one fix to the geofence watch and the movement session.
    /// The two results are independent; one failing does not skip the other.
    pub fn on_location(
        &mut self,
        watch: &mut GeofenceWatch,
        session: &mut MovementSession,
        sample: GpsSample,
        now: DateTime<Utc>,
    ) -> LocationUpdate {
        let reading = self.on_geofence_sample(watch, &sample, now);
        let movement = self.on_movement_sample(session, sample);
        LocationUpdate { reading, movement }
    }

    pub fn on_geofence_sample(
        &mut self,
        watch: &mut GeofenceWatch,
        sample: &GpsSample,
        now: DateTime<Utc>,
    ) -> Result<GeofenceReading, InvalidTransitionError> {
        let reading = self.geofence.evaluate(watch, sample, now)?;
        self.dispatch(&reading.signals);
        Ok(reading)
    }

    pub fn on_movement_sample(
        &mut self,
        session: &mut MovementSession,
        sample: GpsSample,
    ) -> Result<AppendOutcome, InvalidTransitionError> {
        let outcome = self.movement.append(session, sample)?;
        self.dispatch(outcome.signals());
        Ok(outcome)
    }

    pub fn complete_session(&mut self, session: &mut MovementSession) -> CompletionOutcome {
        let outcome = self.movement.complete(session);
        self.dispatch(&outcome.signals);
        outcome
    }

    // ─── Quests ─────────────────────────────────────────────────────────────

    pub fn on_quest_tick(
        &mut self,
        alert: &mut QuestAlert,
        elapsed_secs: u32,
    ) -> Result<TickOutcome, InvalidTransitionError> {
        let outcome = self.quests.tick(alert, elapsed_secs)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    pub fn on_quest_drive(
        &mut self,
        alert: &mut QuestAlert,
        ticker: &mut impl TickSource,
    ) -> Result<DriveOutcome, InvalidTransitionError> {
        let outcome = self.quests.drive(alert, ticker)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    /// Catch a quest up to the clock (e.g. on resume)
    pub fn sync_quest(
        &mut self,
        alert: &mut QuestAlert,
        clock: &impl Clock,
    ) -> Result<TickOutcome, InvalidTransitionError> {
        let outcome = self.quests.sync_to(alert, clock.now())?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    pub fn boost_quest(
        &mut self,
        alert: &mut QuestAlert,
        boost_cents: u64,
    ) -> Result<BoostOutcome, InvalidTransitionError> {
        let outcome = self.quests.apply_boost(alert, boost_cents)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    pub fn accept_quest(
        &mut self,
        alert: &mut QuestAlert,
    ) -> Result<DecisionOutcome, InvalidTransitionError> {
        let outcome = self.quests.accept(alert)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    pub fn decline_quest(
        &mut self,
        alert: &mut QuestAlert,
    ) -> Result<DecisionOutcome, InvalidTransitionError> {
        let outcome = self.quests.decline(alert)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    pub fn cancel_quest(
        &mut self,
        alert: &mut QuestAlert,
    ) -> Result<DecisionOutcome, InvalidTransitionError> {
        let outcome = self.quests.cancel(alert)?;
        self.dispatch(&outcome.signals);
        Ok(outcome)
    }

    fn dispatch(&mut self, signals: &[LiveSignal]) {
        if signals.is_empty() {
            return;
        }
        for handler in &mut self.handlers {
            handler.handle_signals(signals);
        }
    }
}
