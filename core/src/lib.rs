pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod geo;
pub mod geofence;
pub mod movement;
pub mod quest;

// Re-exports for convenience
pub use clock::{
    ChannelTicker, Clock, ManualClock, ManualTicker, SystemClock, TickSender, TickSource,
};
pub use context::{ConfigError, EngineConfig, EngineConfigExt, LiveContext, LocationUpdate};
pub use error::{
    ConfigurationError, InvalidTransitionError, LiveError, MalformedSampleError, StaleInputError,
};
pub use events::{LiveSignal, SignalHandler, SignalRecorder, TracingHandler};
pub use geo::{Coordinate, GpsSample, haversine_distance_m};
pub use geofence::{GeofenceEvaluator, GeofenceReading, GeofenceRegion, GeofenceWatch, ProximityState};
pub use movement::{
    AppendOutcome, CompletionOutcome, FlagKind, MovementFlag, MovementFlagger, MovementSession,
    SessionStatus, TripSummary,
};
pub use quest::{QuestAlert, QuestStatus, QuestUrgencyEngine, Transition, UrgencyTier};
