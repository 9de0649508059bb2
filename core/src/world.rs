//! External collaborator traits.
//!
//! RULE: Zones talk to the scene ONLY through these traits.
//! A zone never reaches into scene internals, never creates or destroys an
//! entity, and treats a stale id as "already exited".
//!
//! The split mirrors the hardware/engine seams of the installation: spatial
//! queries, per-entity actuation (animation triggers + named integer
//! counters), an optional locomotion controller, and an optional transient
//! marker spawner. Anything optional that is absent is silently skipped.

use crate::types::EntityId;
use glam::Vec3;

/// Handle to a spawned transient marker (floating icon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

/// Sphere queries against current world state. Deterministic for a given
/// world state; re-evaluated every tick, never cached across ticks.
pub trait SpatialQuery {
    /// Entities carrying `tag` within `radius` of `center`, sorted by id.
    /// A non-positive radius yields an empty set.
    fn query(&self, center: Vec3, radius: f32, tag: &str) -> Vec<EntityId>;

    /// Current position, or `None` for a stale/destroyed id.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Every live entity in the scene, sorted by id.
    fn all_entities(&self) -> Vec<EntityId>;

    /// Every live entity carrying `tag`, sorted by id.
    fn entities_with_tag(&self, tag: &str) -> Vec<EntityId>;
}

/// Per-entity signal and counter actuation.
pub trait ActuationSink {
    /// Send a named signal (animation trigger) to one entity. Empty names
    /// and stale ids are no-ops.
    fn send_signal(&mut self, entity: EntityId, name: &str);

    /// Read a named integer counter on one entity (0 when unset or stale).
    fn counter(&self, entity: EntityId, name: &str) -> i64;

    fn set_counter(&mut self, entity: EntityId, name: &str, value: i64);
}

/// Optional per-entity locomotion control. Entities without a controller
/// (parked props, the ending marker) ignore all of these.
pub trait Locomotion {
    fn pause(&mut self, entity: EntityId);

    fn resume(&mut self, entity: EntityId);

    /// `true` stops navigation/physics and zeroes velocity; `false`
    /// restores the state recorded at capture time.
    fn set_captured(&mut self, entity: EntityId, captured: bool);

    /// Snap the entity back onto the nearest valid navigation position.
    fn warp_to_nearest_valid(&mut self, entity: EntityId);
}

/// Optional transient marker spawner (floating icons above heads).
pub trait MarkerSpawner {
    /// Returns `None` when no spawner is wired — callers skip the step.
    fn spawn_marker(
        &mut self,
        entity: EntityId,
        offset: Vec3,
        lifetime: f32,
    ) -> Option<MarkerHandle>;

    fn destroy_marker(&mut self, handle: MarkerHandle);

    /// Whether the marker behind `handle` still exists. Markers spawned
    /// with a finite lifetime expire on their own; holders use this to
    /// drop handles that no longer point at anything.
    fn marker_alive(&self, handle: MarkerHandle) -> bool;
}

/// The full collaborator surface a zone ticks against.
pub trait World: SpatialQuery + ActuationSink + Locomotion + MarkerSpawner {
    fn set_position(&mut self, entity: EntityId, position: Vec3);

    /// Step any world-owned motion (waypoint walkers, marker lifetimes).
    /// Worlds driven entirely from outside leave this as the default no-op.
    fn advance(&mut self, _dt: f32) {}
}
