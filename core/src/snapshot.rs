//! Snapshot serialization — engine state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL ticks and captures the
//! observable zone state (captures, latches, gauge) plus the clock. It is
//! diagnostic state for the operator console, not a resume point: entity
//! positions live in the host scene, not here.

use crate::{
    clock::SimClock,
    types::{SessionId, Tick},
    zone::ZoneSnapshot,
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_INTERVAL: Tick = 600; // one simulated minute at 10 Hz

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub session_id: SessionId,
    pub tick: Tick,
    pub clock: SimClock,
    pub zones: Vec<ZoneSnapshot>,
}
