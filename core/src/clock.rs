//! Injectable time sources
//!
//! Engines never read the wall clock themselves. Callers hand them a
//! `Clock` reading or drain a `TickSource`, which keeps countdowns
//! deterministic under replay and in tests.

use std::cell::Cell;
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;

// ═══════════════════════════════════════════════════════════════════════════
// Clocks
// ═══════════════════════════════════════════════════════════════════════════

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test-controllable clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tick Sources
// ═══════════════════════════════════════════════════════════════════════════

/// Discrete countdown ticks, each carrying the whole seconds elapsed since the last one
pub trait TickSource {
    /// Next pending tick, or None when nothing is queued
    fn next_tick(&mut self) -> Option<u32>;
}

/// Ticks queued up front (tests, replays)
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    pending: VecDeque<u32>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` ticks of one second each
    pub fn seconds(count: u32) -> Self {
        Self {
            pending: std::iter::repeat_n(1, count as usize).collect(),
        }
    }

    pub fn push(&mut self, elapsed_secs: u32) {
        self.pending.push_back(elapsed_secs);
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TickSource for ManualTicker {
    fn next_tick(&mut self) -> Option<u32> {
        self.pending.pop_front()
    }
}

impl FromIterator<u32> for ManualTicker {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

/// Sending half of a [`ChannelTicker`]. Cloneable, so a timer task and a
/// test harness can both feed the same countdown.
#[derive(Debug, Clone)]
pub struct TickSender {
    tx: mpsc::UnboundedSender<u32>,
}

impl TickSender {
    /// Queue a tick. Returns false once the receiving ticker is gone.
    pub fn tick(&self, elapsed_secs: u32) -> bool {
        self.tx.send(elapsed_secs).is_ok()
    }
}

/// Ticks delivered over a channel from an external timer
#[derive(Debug)]
pub struct ChannelTicker {
    rx: mpsc::UnboundedReceiver<u32>,
}

impl ChannelTicker {
    pub fn channel() -> (TickSender, ChannelTicker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TickSender { tx }, ChannelTicker { rx })
    }
}

impl TickSource for ChannelTicker {
    fn next_tick(&mut self) -> Option<u32> {
        self.rx.try_recv().ok()
    }
}
