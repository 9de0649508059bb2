//! Simulation clock — owns tick state, the fixed timestep, and pause.

use crate::types::{SessionId, Tick};
use serde::{Deserialize, Serialize};

/// Seconds of simulated time per tick. 10 Hz matches the cadence the
/// installation's sensor loop polls at.
pub const DEFAULT_DT: f32 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub session_id:   SessionId,
    pub current_tick: Tick,
    /// Simulated seconds that elapse per tick.
    pub dt:           f32,
    pub paused:       bool,
}

impl SimClock {
    pub fn new(session_id: SessionId) -> Self {
        Self::with_dt(session_id, DEFAULT_DT)
    }

    pub fn with_dt(session_id: SessionId, dt: f32) -> Self {
        Self {
            session_id,
            current_tick: 0,
            dt,
            paused: true,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if called while paused — callers must check.
    pub fn advance(&mut self) -> Tick {
        assert!(!self.paused, "advance() called on paused clock");
        self.current_tick += 1;
        self.current_tick
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    /// Simulated seconds elapsed since tick 0.
    pub fn elapsed(&self) -> f32 {
        self.current_tick as f32 * self.dt
    }
}
