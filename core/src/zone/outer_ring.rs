//! Secondary larger-radius detector around a zone.
//!
//! The ring watches a different classification at `radius × multiplier`
//! and reacts only while the zone actually holds someone. Members get the
//! periodic marker cadence; leaving the ring optionally sends the zone
//! clear signal (the litter variant reuses it as its reset trigger).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::event::SimEvent;
use crate::types::{EntityId, Tick};
use crate::world::World;

use super::Zone;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OuterRing {
    inside: BTreeSet<EntityId>,
    /// Per-member marker cadence accumulators.
    cadence: BTreeMap<EntityId, f32>,
}

impl OuterRing {
    pub fn member_ids(&self) -> Vec<EntityId> {
        self.inside.iter().copied().collect()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.inside.contains(&entity)
    }
}

impl Zone {
    pub(crate) fn tick_ring(
        &mut self,
        tick: Tick,
        dt: f32,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        let Some(outer) = self.cfg.outer.clone() else {
            return;
        };
        if outer.radius_multiplier <= 0.0 || self.cfg.radius <= 0.0 {
            return;
        }

        // The ring only means something while the zone holds someone.
        if self.capture.captured_count() == 0 {
            self.clear_ring(world);
            return;
        }

        let radius = self.cfg.radius * outer.radius_multiplier;
        let current: BTreeSet<EntityId> = world
            .query(self.center, radius, &outer.tag)
            .into_iter()
            .filter(|e| !self.capture.is_captured(*e))
            .collect();

        for entity in current.difference(&self.ring.inside).copied() {
            self.ring.cadence.insert(entity, 0.0);
            events.push(SimEvent::RingEntered {
                tick,
                zone: self.cfg.name.clone(),
                entity,
            });
        }
        let exited: Vec<EntityId> = self.ring.inside.difference(&current).copied().collect();
        for entity in exited {
            self.ring.cadence.remove(&entity);
            if outer.send_clear_on_exit {
                world.send_signal(entity, &self.cfg.clear_signal);
            }
            self.destroy_markers_for(entity, world);
            events.push(SimEvent::RingExited {
                tick,
                zone: self.cfg.name.clone(),
                entity,
            });
        }
        self.ring.inside = current;

        if outer.spawn_delay > 0.0 {
            let offset = Vec3::new(0.0, self.cfg.marker_offset_y, 0.0);
            for entity in self.ring.member_ids() {
                let Some(acc) = self.ring.cadence.get_mut(&entity) else {
                    continue;
                };
                *acc += dt;
                if *acc < outer.spawn_delay {
                    continue;
                }
                *acc = 0.0;
                if let Some(handle) = world.spawn_marker(entity, offset, self.cfg.marker_lifetime) {
                    self.track_marker(entity, handle, world);
                    events.push(SimEvent::MarkerSpawned {
                        tick,
                        zone: self.cfg.name.clone(),
                        entity,
                        source: "ring".to_string(),
                    });
                }
            }
        }
    }

    /// Tear the ring down without ceremony: destroy its markers, forget its
    /// members. Used when nothing is captured and by the force paths.
    pub(crate) fn clear_ring(&mut self, world: &mut dyn World) {
        for entity in self.ring.member_ids() {
            self.destroy_markers_for(entity, world);
        }
        self.ring.inside.clear();
        self.ring.cadence.clear();
    }
}
