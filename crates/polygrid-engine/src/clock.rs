//! Session clock with lookahead scheduling

use polygrid_core::{step_duration_secs, ClockConfig};
use std::time::Instant;

/// Source of the shared timing clock, in seconds
pub trait TimeSource: Send {
    fn now(&self) -> f64;
}

/// Time source backed by a monotonic process clock
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// A step boundary with its exact trigger time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub global_step: u64,
    /// Absolute trigger time in seconds on the shared timing clock
    pub at: f64,
}

/// Advances the global step counter at tempo-derived intervals.
///
/// A coarse periodic pass pulls every step boundary that falls inside the
/// lookahead window and stamps it with its exact target time; the pass
/// cadence never shows up in trigger timestamps. Tempo changes take effect
/// from the next unscheduled boundary onward, without re-triggering steps
/// already handed out.
#[derive(Debug)]
pub struct SessionClock {
    transport: TransportState,
    global_step: u64,
    next_step_time: f64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            transport: TransportState::Stopped,
            global_step: 0,
            next_step_time: 0.0,
        }
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Start or resume playback; the next step lands at `now`
    pub fn play(&mut self, now: f64) {
        if self.transport != TransportState::Playing {
            self.transport = TransportState::Playing;
            self.next_step_time = now;
        }
    }

    /// Pause without resetting the global step
    pub fn pause(&mut self) {
        if self.transport == TransportState::Playing {
            self.transport = TransportState::Paused;
        }
    }

    /// Stop and rewind the global step to 0
    pub fn stop(&mut self) {
        self.transport = TransportState::Stopped;
        self.global_step = 0;
    }

    /// One scheduling pass: every step boundary whose trigger time falls
    /// before `now + lookahead`, each stamped with its exact time.
    pub fn pass(&mut self, now: f64, config: &ClockConfig) -> Vec<StepEvent> {
        let mut events = Vec::new();
        if self.transport != TransportState::Playing {
            return events;
        }

        let horizon = now + config.lookahead_secs;
        while self.next_step_time < horizon {
            events.push(StepEvent { global_step: self.global_step, at: self.next_step_time });
            self.global_step += 1;
            self.next_step_time += step_duration_secs(config.tempo_bpm);
        }
        events
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
