//! Discomfort escalation and the audience-facing gauge.
//!
//! Two accumulation modes: hold-style zones run one timer per captured
//! entity and the gauge reads the worst of them; observe-style zones run a
//! single shared timer that advances whenever occupancy is non-empty. The
//! gauge is presentation state and saturates at the configured maximum
//! rather than wrapping or erroring.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EscalationMode;
use crate::event::SimEvent;
use crate::types::{EntityId, Tick};
use crate::world::World;

use super::Zone;

/// Gauge fraction at which the warning presentation kicks in.
pub const WARNING_THRESHOLD: f32 = 0.5;

/// One sample of the gauge, as shown to the audience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeReading {
    pub active: bool,
    /// Accumulated discomfort over the configured maximum, clamped to 0..1.
    pub ratio: f32,
    pub warning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    mode: EscalationMode,
    /// Per-captive accumulated seconds (hold-style zones).
    per_entity: BTreeMap<EntityId, f32>,
    /// Shared accumulated seconds (observe-style zones).
    global: f32,
    /// Per-captive marker cadence accumulators.
    cadence: BTreeMap<EntityId, f32>,
    /// Edge latch for threshold-crossing events.
    warning: bool,
}

impl Escalation {
    pub fn new(mode: EscalationMode) -> Self {
        Self {
            mode,
            per_entity: BTreeMap::new(),
            global: 0.0,
            cadence: BTreeMap::new(),
            warning: false,
        }
    }

    /// Begin tracking a freshly captured entity.
    pub fn start(&mut self, entity: EntityId) {
        if self.mode == EscalationMode::PerEntity {
            self.per_entity.insert(entity, 0.0);
        }
        self.cadence.insert(entity, 0.0);
    }

    /// Stop tracking a released or stale entity. The shared timer is
    /// presentation state and survives individual releases.
    pub fn remove(&mut self, entity: EntityId) {
        self.per_entity.remove(&entity);
        self.cadence.remove(&entity);
    }

    /// Reset the audience-facing side without touching per-entity timers.
    pub fn reset_presentation(&mut self) {
        self.global = 0.0;
        self.warning = false;
    }

    pub fn accumulated(&self) -> f32 {
        match self.mode {
            EscalationMode::PerEntity => self
                .per_entity
                .values()
                .fold(0.0_f32, |acc, v| acc.max(*v)),
            EscalationMode::ZoneGlobal => self.global,
        }
    }

    pub fn gauge(&self, enabled: bool, max_duration: f32, captured_count: usize) -> GaugeReading {
        if !enabled || max_duration <= 0.0 {
            return GaugeReading {
                active: false,
                ratio: 0.0,
                warning: false,
            };
        }
        let value = self.accumulated();
        let active = match self.mode {
            EscalationMode::PerEntity => captured_count > 0,
            EscalationMode::ZoneGlobal => value > 0.0,
        };
        let ratio = (value / max_duration).clamp(0.0, 1.0);
        GaugeReading {
            active,
            ratio,
            warning: ratio >= WARNING_THRESHOLD,
        }
    }
}

impl Zone {
    /// Escalation step: stale cleanup, vertical pinning, timer accumulation,
    /// captive marker cadence.
    pub(crate) fn tick_escalation(
        &mut self,
        tick: Tick,
        dt: f32,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        // Entities destroyed mid-capture vanish without signals; a stale id
        // can no longer receive them anyway.
        for entity in self.capture.captured_ids() {
            if world.position(entity).is_none() {
                self.occupancy.remove(entity);
                self.capture.drop_entity(entity);
                self.escalation.remove(entity);
                self.destroy_markers_for(entity, world);
            }
        }

        if self.cfg.hold_captives {
            for entity in self.capture.captured_ids() {
                let (Some(pos), Some(y)) = (world.position(entity), self.capture.frozen_y(entity))
                else {
                    continue;
                };
                if pos.y != y {
                    world.set_position(entity, Vec3::new(pos.x, y, pos.z));
                }
            }
        }

        match self.cfg.escalation {
            EscalationMode::PerEntity => {
                for entity in self.capture.captured_ids() {
                    if let Some(v) = self.escalation.per_entity.get_mut(&entity) {
                        *v += dt;
                    }
                }
            }
            EscalationMode::ZoneGlobal => {
                if !self.occupancy.is_empty() {
                    self.escalation.global += dt;
                }
            }
        }

        if self.cfg.marker_spawn_delay > 0.0 {
            let offset = Vec3::new(0.0, self.cfg.marker_offset_y, 0.0);
            for entity in self.capture.captured_ids() {
                let Some(acc) = self.escalation.cadence.get_mut(&entity) else {
                    continue;
                };
                *acc += dt;
                if *acc < self.cfg.marker_spawn_delay {
                    continue;
                }
                *acc = 0.0;
                if let Some(handle) = world.spawn_marker(entity, offset, self.cfg.marker_lifetime) {
                    self.track_marker(entity, handle, world);
                    events.push(SimEvent::MarkerSpawned {
                        tick,
                        zone: self.cfg.name.clone(),
                        entity,
                        source: "captive".to_string(),
                    });
                }
            }
        }
    }

    /// Emit an event on either edge of the warning threshold.
    pub(crate) fn refresh_gauge(&mut self, tick: Tick, events: &mut Vec<SimEvent>) {
        let reading = self.gauge();
        if reading.warning != self.escalation.warning {
            self.escalation.warning = reading.warning;
            events.push(SimEvent::GaugeThresholdCrossed {
                tick,
                zone: self.cfg.name.clone(),
                ratio: reading.ratio,
                warning: reading.warning,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_entity_gauge_reads_the_maximum() {
        let mut esc = Escalation::new(EscalationMode::PerEntity);
        esc.start(1);
        esc.start(2);
        *esc.per_entity.get_mut(&1).unwrap() = 4.0;
        *esc.per_entity.get_mut(&2).unwrap() = 9.0;
        let g = esc.gauge(true, 30.0, 2);
        assert!(g.active);
        assert!((g.ratio - 0.3).abs() < 1e-6);
        assert!(!g.warning);
    }

    #[test]
    fn gauge_saturates_and_warns() {
        let mut esc = Escalation::new(EscalationMode::ZoneGlobal);
        esc.global = 45.0;
        let g = esc.gauge(true, 30.0, 0);
        assert_eq!(g.ratio, 1.0);
        assert!(g.warning);
    }

    #[test]
    fn long_holds_shed_expired_marker_handles() {
        use crate::config::ZoneConfig;
        use crate::rng::StreamRng;
        use crate::scene::Scene;
        use crate::zone::Zone;

        let mut cfg = ZoneConfig::litter(Vec3::ZERO);
        cfg.marker_spawn_delay = 1.0;
        cfg.marker_lifetime = 1.0;
        let mut zone = Zone::new(cfg);
        let mut rng = StreamRng::new(7, 0);
        let mut scene = Scene::new();
        let person = scene.add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

        let mut spawned = 0;
        for tick in 0..20u64 {
            crate::world::World::advance(&mut scene, 1.0);
            for event in zone.tick(tick, 1.0, &mut scene, &mut rng) {
                if matches!(event, SimEvent::MarkerSpawned { .. }) {
                    spawned += 1;
                }
            }
        }

        assert!(spawned >= 10);
        // Handles of expired markers must not pile up across the hold.
        assert!(zone.markers.get(&person).map_or(0, Vec::len) <= 1);
    }

    #[test]
    fn disabled_gauge_is_inert() {
        let mut esc = Escalation::new(EscalationMode::PerEntity);
        esc.start(1);
        *esc.per_entity.get_mut(&1).unwrap() = 100.0;
        let g = esc.gauge(false, 30.0, 1);
        assert!(!g.active && g.ratio == 0.0 && !g.warning);
    }
}
