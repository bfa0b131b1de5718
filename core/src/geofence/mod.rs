//! Geofence system
//!
//! This module provides:
//! - **Regions**: circular task geofences, validated on creation
//! - **Watches**: per-worker arming state so Smart Start fires once per entry
//! - **Evaluator**: containment, proximity and input-quality gating
//!
//! # Smart Start
//!
//! 1. Worker's first usable fix inside the region → `SmartStartTriggered`
//! 2. Further fixes inside → nothing (no re-fire while dwelling)
//! 3. Fix outside → `GeofenceExited`, watch re-armed
//! 4. Next fix inside → `SmartStartTriggered` again

mod evaluator;
mod region;


pub use evaluator::{GeofenceEvaluator, GeofenceReading, GeofenceWatch, ProximityState};
pub use region::GeofenceRegion;
