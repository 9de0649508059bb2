//! In-memory reference scene.
//!
//! Implements the collaborator traits the zones tick against: tagged
//! entities with positions, optional waypoint locomotion, per-entity signal
//! logs and named counters, and transient markers with lifetimes.
//!
//! Locomotion here is deliberately trivial (straight ping-pong between
//! waypoints on a flat ground plane) — the real installation drives these
//! traits from its own navigation stack, and zone logic never sees more
//! than pause/resume/warp.

use glam::Vec3;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::types::EntityId;
use crate::world::{ActuationSink, Locomotion, MarkerHandle, MarkerSpawner, SpatialQuery, World};

#[derive(Debug, Clone)]
struct Walker {
    waypoints: Vec<Vec3>,
    speed: f32,
    target: usize,
    direction: i32,
}

#[derive(Debug, Clone)]
struct SceneEntity {
    tags: BTreeSet<String>,
    position: Vec3,
    walker: Option<Walker>,
    paused: bool,
    captured: bool,
    captured_before: bool,
    counters: BTreeMap<String, i64>,
    signals: Vec<String>,
}

#[derive(Debug, Clone)]
struct Marker {
    entity: EntityId,
    /// `None` lives until explicitly destroyed.
    remaining: Option<f32>,
}

/// The scriptable world used by the runner and the integration tests.
#[derive(Debug, Default)]
pub struct Scene {
    entities: BTreeMap<EntityId, SceneEntity>,
    next_entity: EntityId,
    markers: BTreeMap<u64, Marker>,
    next_marker: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stationary entity. Tags classify it for spatial queries.
    pub fn add_entity(&mut self, tags: &[&str], position: Vec3) -> EntityId {
        let id = self.next_entity;
        self.next_entity += 1;
        self.entities.insert(
            id,
            SceneEntity {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                position,
                walker: None,
                paused: false,
                captured: false,
                captured_before: false,
                counters: BTreeMap::new(),
                signals: Vec::new(),
            },
        );
        id
    }

    /// Add an entity that walks back and forth along `waypoints`.
    pub fn add_walker(
        &mut self,
        tags: &[&str],
        position: Vec3,
        waypoints: Vec<Vec3>,
        speed: f32,
    ) -> EntityId {
        let id = self.add_entity(tags, position);
        if let Some(e) = self.entities.get_mut(&id) {
            e.walker = Some(Walker {
                waypoints,
                speed,
                target: 0,
                direction: 1,
            });
        }
        id
    }

    /// Destroy an entity out from under the engine; zones must cope.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
        self.markers.retain(|_, m| m.entity != entity);
    }

    pub fn teleport(&mut self, entity: EntityId, position: Vec3) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.position = position;
        }
    }

    // ── Test/runner observation helpers ────────────────────────

    pub fn signals(&self, entity: EntityId) -> &[String] {
        self.entities
            .get(&entity)
            .map(|e| e.signals.as_slice())
            .unwrap_or(&[])
    }

    pub fn signal_count(&self, entity: EntityId, name: &str) -> usize {
        self.signals(entity).iter().filter(|s| *s == name).count()
    }

    pub fn is_paused(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).map(|e| e.paused).unwrap_or(false)
    }

    pub fn is_kinematic(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .map(|e| e.captured)
            .unwrap_or(false)
    }

    pub fn marker_count_for(&self, entity: EntityId) -> usize {
        self.markers.values().filter(|m| m.entity == entity).count()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl SpatialQuery for Scene {
    fn query(&self, center: Vec3, radius: f32, tag: &str) -> Vec<EntityId> {
        if radius <= 0.0 || tag.is_empty() {
            return Vec::new();
        }
        self.entities
            .iter()
            .filter(|(_, e)| e.tags.contains(tag) && e.position.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.position)
    }

    fn all_entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    fn entities_with_tag(&self, tag: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.tags.contains(tag))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ActuationSink for Scene {
    fn send_signal(&mut self, entity: EntityId, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Some(e) = self.entities.get_mut(&entity) {
            e.signals.push(name.to_string());
        }
    }

    fn counter(&self, entity: EntityId, name: &str) -> i64 {
        self.entities
            .get(&entity)
            .and_then(|e| e.counters.get(name).copied())
            .unwrap_or(0)
    }

    fn set_counter(&mut self, entity: EntityId, name: &str, value: i64) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.counters.insert(name.to_string(), value);
        }
    }
}

impl Locomotion for Scene {
    fn pause(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            if e.walker.is_some() {
                e.paused = true;
            }
        }
    }

    fn resume(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            if e.walker.is_some() {
                e.paused = false;
            }
        }
    }

    fn set_captured(&mut self, entity: EntityId, captured: bool) {
        if let Some(e) = self.entities.get_mut(&entity) {
            if captured {
                e.captured_before = e.captured;
                e.captured = true;
            } else {
                e.captured = e.captured_before;
                e.captured_before = false;
            }
        }
    }

    fn warp_to_nearest_valid(&mut self, entity: EntityId) {
        // The demo ground plane is y = 0; "nearest valid" snaps back to it.
        if let Some(e) = self.entities.get_mut(&entity) {
            e.position.y = 0.0;
        }
    }
}

impl MarkerSpawner for Scene {
    fn spawn_marker(
        &mut self,
        entity: EntityId,
        _offset: Vec3,
        lifetime: f32,
    ) -> Option<MarkerHandle> {
        if !self.entities.contains_key(&entity) {
            return None;
        }
        let handle = self.next_marker;
        self.next_marker += 1;
        self.markers.insert(
            handle,
            Marker {
                entity,
                remaining: (lifetime > 0.0).then_some(lifetime),
            },
        );
        Some(MarkerHandle(handle))
    }

    fn destroy_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle.0);
    }

    fn marker_alive(&self, handle: MarkerHandle) -> bool {
        self.markers.contains_key(&handle.0)
    }
}

impl World for Scene {
    fn set_position(&mut self, entity: EntityId, position: Vec3) {
        self.teleport(entity, position);
    }

    fn advance(&mut self, dt: f32) {
        for e in self.entities.values_mut() {
            if e.paused || e.captured {
                continue;
            }
            let Some(walker) = e.walker.as_mut() else { continue };
            if walker.waypoints.is_empty() {
                continue;
            }
            let target = walker.waypoints[walker.target];
            let mut dir = target - e.position;
            dir.y = 0.0;
            let dist = dir.length();
            if dist > 1e-3 {
                let step = (walker.speed * dt).min(dist);
                e.position += dir / dist * step;
            }
            if dist <= 0.15 {
                // Ping-pong along the waypoint list.
                let next = walker.target as i32 + walker.direction;
                if next < 0 || next as usize >= walker.waypoints.len() {
                    walker.direction = -walker.direction;
                }
                walker.target =
                    (walker.target as i32 + walker.direction).clamp(0, walker.waypoints.len() as i32 - 1)
                        as usize;
            }
        }

        // Age out expired markers.
        self.markers.retain(|_, m| match m.remaining.as_mut() {
            Some(r) => {
                *r -= dt;
                *r > 0.0
            }
            None => true,
        });
    }
}
