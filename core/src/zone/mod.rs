//! The zone interaction engine.
//!
//! One `Zone` subsumes the four production behaviors (smoking, litter,
//! car congestion, generic crowd) behind a single configurable pipeline.
//! Per tick, in fixed order: legal-area override guard → occupancy deltas →
//! capture-delay evaluation → escalation and markers → outer ring → ending
//! detection. The order is a contract: an entity that exits and would also
//! be reached by an ending broadcast in the same tick is always released
//! first.
//!
//! Zones never own entities. Everything observable happens through the
//! `World` collaborator traits and is reported as `SimEvent`s.

pub mod capture;
pub mod ending;
pub mod escalation;
pub mod occupancy;
pub mod outer_ring;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{AnchorMode, ZoneConfig};
use crate::event::SimEvent;
use crate::rng::StreamRng;
use crate::scheduler::{TimerEntry, TimerPurpose, TimerQueue};
use crate::types::{EntityId, Tick};
use crate::world::{MarkerHandle, World};

use capture::CaptureState;
use escalation::{Escalation, GaugeReading};
use occupancy::Occupancy;
use outer_ring::OuterRing;

pub struct Zone {
    pub(crate) cfg: ZoneConfig,
    /// Runtime position; `ZoneToAnchor` zones relocate on show.
    pub(crate) center: Vec3,
    /// Master tick switch. Cleared by the ending sequence and `hide()`,
    /// set by `show()`.
    pub(crate) enabled: bool,
    /// Movable ending-anchor entity, wired by the host after spawn.
    pub(crate) anchor: Option<EntityId>,

    pub(crate) occupancy: Occupancy,
    pub(crate) capture: CaptureState,
    pub(crate) escalation: Escalation,
    pub(crate) ring: OuterRing,
    pub(crate) ending_activated: bool,
    pub(crate) end_count_given: bool,

    pub(crate) timers: TimerQueue,
    /// Spawned marker handles per entity, captive and ring alike.
    pub(crate) markers: BTreeMap<EntityId, Vec<MarkerHandle>>,
}

impl Zone {
    pub fn new(cfg: ZoneConfig) -> Self {
        let center = cfg.position_vec();
        let escalation = Escalation::new(cfg.escalation);
        Self {
            cfg,
            center,
            enabled: true,
            anchor: None,
            occupancy: Occupancy::default(),
            capture: CaptureState::default(),
            escalation,
            ring: OuterRing::default(),
            ending_activated: false,
            end_count_given: false,
            timers: TimerQueue::new(),
            markers: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Wire the movable ending-anchor entity for this zone.
    pub fn set_anchor(&mut self, entity: EntityId) {
        self.anchor = Some(entity);
    }

    /// Advance one tick.
    pub fn tick(
        &mut self,
        tick: Tick,
        dt: f32,
        world: &mut dyn World,
        rng: &mut StreamRng,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();

        if !self.enabled {
            // Post-ending deferred work (resume, end-off, horns) still
            // drains while the zone itself is suspended.
            let due = self.timers.advance(dt);
            self.handle_due_timers(due, tick, world, &mut events);
            return events;
        }

        // Higher-priority guard: a sanctioned area inside the radius
        // force-releases everyone and suppresses capture for this tick.
        if self.legal_override_active(world) {
            let released = self.force_release_all(tick, world, &mut events);
            let cancelled = self.cancel_all_pending(tick, &mut events);
            self.clear_ring(world);
            if released + cancelled > 0 {
                events.push(SimEvent::LegalAreaOverride {
                    tick,
                    zone: self.cfg.name.clone(),
                    released,
                });
            }
            let due = self.timers.advance(dt);
            self.handle_due_timers(due, tick, world, &mut events);
            self.refresh_gauge(tick, &mut events);
            return events;
        }

        // 1) Occupancy deltas.
        let current = if self.cfg.radius > 0.0 {
            world
                .query(self.center, self.cfg.radius, &self.cfg.person_tag)
                .into_iter()
                .collect()
        } else {
            Default::default()
        };
        let delta = self.occupancy.observe(current);
        for entity in delta.exited {
            self.handle_exit(entity, tick, world, &mut events);
        }
        for entity in delta.entered {
            self.handle_entry(entity, tick, rng, &mut events);
        }

        // 2) Capture-delay evaluation and any other due deferred work.
        let due = self.timers.advance(dt);
        self.handle_due_timers(due, tick, world, &mut events);

        // 3) Escalation, vertical pinning, captive marker cadence.
        self.tick_escalation(tick, dt, world, &mut events);
        self.refresh_gauge(tick, &mut events);

        // 4) Outer ring.
        self.tick_ring(tick, dt, world, &mut events);

        // 5) Ending detection, strictly last.
        self.check_ending(tick, world, &mut events);

        events
    }

    fn handle_due_timers(
        &mut self,
        due: Vec<TimerEntry>,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        for timer in due {
            match timer.purpose {
                TimerPurpose::CaptureDelay => {
                    if let Some(entity) = timer.entity {
                        self.complete_capture(entity, tick, world, events);
                    }
                }
                TimerPurpose::ResumeAfterRelease => {
                    if let Some(entity) = timer.entity {
                        world.resume(entity);
                    }
                }
                TimerPurpose::ResumeAfterEnd => {
                    if let Some(entity) = timer.entity {
                        world.resume(entity);
                        world.send_signal(entity, &self.cfg.end_off_signal);
                        events.push(SimEvent::EndResumed {
                            tick,
                            zone: self.cfg.name.clone(),
                            entity,
                        });
                    }
                }
                TimerPurpose::EnableHorns => {
                    if let Some(horn) = self.cfg.horn.clone() {
                        let vehicles = world.entities_with_tag(&horn.vehicle_tag);
                        for v in &vehicles {
                            world.send_signal(*v, &horn.signal);
                        }
                        log::debug!(
                            "tick={tick} zone={} horns enabled on {} vehicles",
                            self.cfg.name,
                            vehicles.len()
                        );
                        events.push(SimEvent::HornsEnabled {
                            tick,
                            zone: self.cfg.name.clone(),
                            vehicles: vehicles.len(),
                        });
                    }
                }
            }
        }
    }

    // ── Sensor lifecycle bridge ────────────────────────────────

    /// Sensor A edge: release everything and go dark. Idempotent.
    pub fn hide(&mut self, tick: Tick, world: &mut dyn World) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let released = self.force_release_all(tick, world, &mut events);
        self.cancel_all_pending(tick, &mut events);
        self.clear_ring(world);
        self.ending_activated = false;
        self.enabled = false;
        events.push(SimEvent::ZoneHidden {
            tick,
            zone: self.cfg.name.clone(),
            released,
        });
        events
    }

    /// Sensor B edge: reset one-shot latches, re-enable ticking, and move
    /// the ending anchor into place. Idempotent.
    pub fn show(&mut self, tick: Tick, world: &mut dyn World) -> Vec<SimEvent> {
        self.enabled = true;
        self.ending_activated = false;
        self.end_count_given = false;
        self.escalation.reset_presentation();

        match self.cfg.anchor_mode {
            AnchorMode::None => {}
            AnchorMode::AnchorToZone => match self.anchor {
                Some(anchor) => world.set_position(anchor, self.center),
                None => log::warn!("zone={} has no ending anchor wired", self.cfg.name),
            },
            AnchorMode::ZoneToAnchor => {
                if let Some(pos) = self.anchor.and_then(|a| world.position(a)) {
                    self.center = pos;
                } else {
                    log::warn!("zone={} has no ending anchor wired", self.cfg.name);
                }
            }
        }

        vec![SimEvent::ZoneShown {
            tick,
            zone: self.cfg.name.clone(),
        }]
    }

    // ── Observation ────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ending_activated(&self) -> bool {
        self.ending_activated
    }

    pub fn end_count_given(&self) -> bool {
        self.end_count_given
    }

    pub fn captured(&self) -> Vec<EntityId> {
        self.capture.captured_ids()
    }

    pub fn pending(&self) -> Vec<EntityId> {
        self.capture.pending_ids()
    }

    pub fn ring_members(&self) -> Vec<EntityId> {
        self.ring.member_ids()
    }

    pub fn gauge(&self) -> GaugeReading {
        self.escalation.gauge(
            self.enabled,
            self.cfg.max_discomfort_duration,
            self.capture.captured_count(),
        )
    }

    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            name: self.cfg.name.clone(),
            enabled: self.enabled,
            ending_activated: self.ending_activated,
            end_count_given: self.end_count_given,
            captured: self.capture.captured_ids(),
            pending: self.capture.pending_ids(),
            ring: self.ring.member_ids(),
            gauge_ratio: self.gauge().ratio,
        }
    }
}

/// Per-zone runtime state as persisted with engine snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub name: String,
    pub enabled: bool,
    pub ending_activated: bool,
    pub end_count_given: bool,
    pub captured: Vec<EntityId>,
    pub pending: Vec<EntityId>,
    pub ring: Vec<EntityId>,
    pub gauge_ratio: f32,
}
