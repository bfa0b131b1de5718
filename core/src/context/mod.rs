mod config;
mod error;
mod live;

#[cfg(test)]
mod live_tests;

pub use config::{
    AutoBoostConfig, EngineConfig, EngineConfigExt, GeofenceConfig, MovementConfig, QuestConfig,
    validate_geofence, validate_movement, validate_quest,
};
pub use error::ConfigError;
pub use live::{LiveContext, LocationUpdate};
