//! Virtual clock for scenario replay
//!
//! Supports multiple replay modes:
//! - Realtime (1x speed): sleep between timeline entries
//! - Accelerated: jump straight to each entry
//! - Custom speed: any multiplier (0.5x slow-mo, 10x fast-forward, etc.)

use chrono::{DateTime, Utc};
use std::time::Duration;

use hustle_core::Clock;

/// Virtual clock that maps scenario time onto wall-clock pacing
#[derive(Debug)]
pub struct VirtualClock {
    /// Scenario start (t = 0)
    scenario_start: DateTime<Utc>,

    /// Current simulated time
    current: DateTime<Utc>,

    /// Speed multiplier (1.0 = realtime, 0.0 = instant, 10.0 = 10x speed)
    speed_multiplier: f32,
}

impl VirtualClock {
    pub fn new(scenario_start: DateTime<Utc>, speed_multiplier: f32) -> Self {
        Self {
            scenario_start,
            current: scenario_start,
            speed_multiplier,
        }
    }

    /// Advance to a scenario timestamp, sleeping when paced.
    /// Never moves backwards.
    pub fn advance_to(&mut self, time: DateTime<Utc>) {
        if time <= self.current {
            return;
        }

        if self.speed_multiplier > 0.0 {
            let delta_ms = (time - self.current).num_milliseconds().max(0) as f32;
            let sleep_ms = (delta_ms / self.speed_multiplier) as u64;
            if sleep_ms > 0 {
                std::thread::sleep(Duration::from_millis(sleep_ms));
            }
        }

        self.current = time;
    }

    /// Seconds since scenario start
    pub fn elapsed_secs(&self) -> f32 {
        (self.current - self.scenario_start).num_milliseconds() as f32 / 1000.0
    }

    /// Format elapsed time as MM:SS.ss
    pub fn format_elapsed(&self) -> String {
        let secs = self.elapsed_secs();
        let mins = (secs / 60.0).floor() as u32;
        format!("{:02}:{:05.2}", mins, secs % 60.0)
    }

    pub fn is_instant_mode(&self) -> bool {
        self.speed_multiplier == 0.0
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_instant_mode_tracks_time() {
        let mut clock = VirtualClock::new(start(), 0.0);
        assert!(clock.is_instant_mode());

        clock.advance_to(start() + ChronoDuration::milliseconds(75_500));
        assert_eq!(clock.elapsed_secs(), 75.5);
        assert_eq!(clock.format_elapsed(), "01:15.50");
        assert_eq!(clock.now(), start() + ChronoDuration::milliseconds(75_500));
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut clock = VirtualClock::new(start(), 0.0);
        clock.advance_to(start() + ChronoDuration::seconds(10));
        clock.advance_to(start() + ChronoDuration::seconds(5));
        assert_eq!(clock.elapsed_secs(), 10.0);
    }
}
