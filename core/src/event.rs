//! The event log — every observable state change the engine makes.
//!
//! RULE: Zones communicate outcomes ONLY through events; external tooling
//! (the runner, tests, replay) reads the journal, never zone internals.
//! Variants are added as the engine grows — never removed or reordered.

use crate::types::{EntityId, SessionId, Tick};
use serde::{Deserialize, Serialize};

/// Every event emitted during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    SessionInitialized {
        session_id: SessionId,
        seed: u64,
    },
    SensorCommandReceived {
        tick: Tick,
        zone: String,
        command: String,
    },

    // ── Occupancy / capture ────────────────────────
    ZoneEntered {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    ZoneExited {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    CaptureScheduled {
        tick: Tick,
        zone: String,
        entity: EntityId,
        delay: f32,
    },
    CaptureCancelled {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    EntityCaptured {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    EntityReleased {
        tick: Tick,
        zone: String,
        entity: EntityId,
        forced: bool,
    },
    LegalAreaOverride {
        tick: Tick,
        zone: String,
        released: usize,
    },

    // ── Escalation / markers ───────────────────────
    MarkerSpawned {
        tick: Tick,
        zone: String,
        entity: EntityId,
        /// "captive" or "ring" depending on which cadence fired.
        source: String,
    },
    GaugeThresholdCrossed {
        tick: Tick,
        zone: String,
        ratio: f32,
        warning: bool,
    },

    // ── Outer ring ─────────────────────────────────
    RingEntered {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    RingExited {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },

    // ── Ending ─────────────────────────────────────
    EndingTriggered {
        tick: Tick,
        zone: String,
        broadcast: usize,
    },
    CompletionCounted {
        tick: Tick,
        zone: String,
        entities: usize,
    },
    EndResumed {
        tick: Tick,
        zone: String,
        entity: EntityId,
    },
    HornsEnabled {
        tick: Tick,
        zone: String,
        vehicles: usize,
    },

    // ── Sensor lifecycle ───────────────────────────
    ZoneHidden {
        tick: Tick,
        zone: String,
        released: usize,
    },
    ZoneShown {
        tick: Tick,
        zone: String,
    },
}

/// Extract a stable string name from a SimEvent variant.
/// Used for the event_type column in event_log.
pub fn event_type_name(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::TickStarted { .. }            => "tick_started",
        SimEvent::TickCompleted { .. }          => "tick_completed",
        SimEvent::SessionInitialized { .. }     => "session_initialized",
        SimEvent::SensorCommandReceived { .. }  => "sensor_command_received",
        SimEvent::ZoneEntered { .. }            => "zone_entered",
        SimEvent::ZoneExited { .. }             => "zone_exited",
        SimEvent::CaptureScheduled { .. }       => "capture_scheduled",
        SimEvent::CaptureCancelled { .. }       => "capture_cancelled",
        SimEvent::EntityCaptured { .. }         => "entity_captured",
        SimEvent::EntityReleased { .. }         => "entity_released",
        SimEvent::LegalAreaOverride { .. }      => "legal_area_override",
        SimEvent::MarkerSpawned { .. }          => "marker_spawned",
        SimEvent::GaugeThresholdCrossed { .. }  => "gauge_threshold_crossed",
        SimEvent::RingEntered { .. }            => "ring_entered",
        SimEvent::RingExited { .. }             => "ring_exited",
        SimEvent::EndingTriggered { .. }        => "ending_triggered",
        SimEvent::CompletionCounted { .. }      => "completion_counted",
        SimEvent::EndResumed { .. }             => "end_resumed",
        SimEvent::HornsEnabled { .. }           => "horns_enabled",
        SimEvent::ZoneHidden { .. }             => "zone_hidden",
        SimEvent::ZoneShown { .. }              => "zone_shown",
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub tick: Tick,
    pub zone: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
