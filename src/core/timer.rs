//! Polled timers
//!
//! Timers are plain values checked against the current time. Nothing fires;
//! callers ask `is_elapsed(now)` when they care. Not restarting a timer is
//! how it gets cancelled.

use serde::{Deserialize, Serialize};

use crate::core::types::Seconds;

/// Counts down a fixed duration from a start time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountdownTimer {
    start_time: Option<Seconds>,
    duration: Seconds,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer already running from `now`
    pub fn started(now: Seconds, duration: Seconds) -> Self {
        Self {
            start_time: Some(now),
            duration,
        }
    }

    pub fn start(&mut self, now: Seconds, duration: Seconds) {
        self.start_time = Some(now);
        self.duration = duration;
    }

    /// Restart with the previous duration
    pub fn reset(&mut self, now: Seconds) {
        self.start_time = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.start_time = None;
    }

    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// An unstarted timer counts as elapsed
    pub fn is_elapsed(&self, now: Seconds) -> bool {
        match self.start_time {
            None => true,
            Some(start) => now >= start + self.duration,
        }
    }

    pub fn remaining(&self, now: Seconds) -> Seconds {
        match self.start_time {
            None => 0.0,
            Some(start) => (start + self.duration - now).max(0.0),
        }
    }

    pub fn duration(&self) -> Seconds {
        self.duration
    }
}

/// Measures time since it was last started
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalTimer {
    start_time: Option<Seconds>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Seconds) {
        self.start_time = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.start_time = None;
    }

    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Elapsed seconds, infinite if never started
    pub fn elapsed(&self, now: Seconds) -> Seconds {
        match self.start_time {
            None => f32::INFINITY,
            Some(start) => now - start,
        }
    }

    pub fn is_greater_than(&self, now: Seconds, duration: Seconds) -> bool {
        self.elapsed(now) > duration
    }

    pub fn is_less_than(&self, now: Seconds, duration: Seconds) -> bool {
        self.elapsed(now) < duration
    }
}
