//! Shared primitive types used across the entire engine.

/// A simulation tick. Ticks advance at a fixed timestep (see `SimClock::dt`).
pub type Tick = u64;

/// A stable, unique identifier for an externally-owned scene entity.
/// The engine never creates or destroys entities, only references them.
pub type EntityId = u64;

/// The canonical session identifier for one installation run.
pub type SessionId = String;
