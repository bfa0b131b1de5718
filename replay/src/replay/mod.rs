//! Replay engine for LIVE-mode scenarios
//!
//! Provides the virtual clock that paces a scenario timeline.

pub mod clock;

pub use clock::VirtualClock;
