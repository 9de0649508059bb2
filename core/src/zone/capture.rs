//! Capture and release: the hold a zone takes on entities inside its
//! radius.
//!
//! Entry schedules a one-shot capture after a delay drawn uniformly from
//! the configured range; leaving before the delay elapses cancels it with
//! no observable effect. A completed capture sends the reaction signal,
//! pauses locomotion, and records the vertical coordinate that is pinned
//! back every tick afterwards. Observe-style zones (`hold_captives =
//! false`) take membership without touching locomotion.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::event::SimEvent;
use crate::rng::StreamRng;
use crate::scheduler::TimerPurpose;
use crate::types::{EntityId, Tick};
use crate::world::{MarkerHandle, World};

use super::Zone;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CaptureState {
    /// Inside the radius, waiting out the randomized capture delay.
    /// Invariant: disjoint from `captured`.
    pending: BTreeSet<EntityId>,
    /// Currently held. Invariant: every member has had the reaction signal
    /// sent and not yet the clear signal.
    captured: BTreeSet<EntityId>,
    /// Vertical coordinate at capture time, re-applied while held.
    frozen_y: BTreeMap<EntityId, f32>,
}

impl CaptureState {
    pub fn is_pending(&self, entity: EntityId) -> bool {
        self.pending.contains(&entity)
    }

    pub fn is_captured(&self, entity: EntityId) -> bool {
        self.captured.contains(&entity)
    }

    pub fn captured_count(&self) -> usize {
        self.captured.len()
    }

    pub fn captured_ids(&self) -> Vec<EntityId> {
        self.captured.iter().copied().collect()
    }

    pub fn pending_ids(&self) -> Vec<EntityId> {
        self.pending.iter().copied().collect()
    }

    pub fn frozen_y(&self, entity: EntityId) -> Option<f32> {
        self.frozen_y.get(&entity).copied()
    }

    fn admit(&mut self, entity: EntityId, frozen_y: Option<f32>) {
        self.pending.remove(&entity);
        self.captured.insert(entity);
        if let Some(y) = frozen_y {
            self.frozen_y.insert(entity, y);
        }
    }

    pub(crate) fn drop_entity(&mut self, entity: EntityId) {
        self.pending.remove(&entity);
        self.captured.remove(&entity);
        self.frozen_y.remove(&entity);
    }
}

impl Zone {
    /// A sanctioned area inside the zone radius suspends the whole tick.
    pub(crate) fn legal_override_active(&self, world: &dyn World) -> bool {
        let Some(tag) = self.cfg.legal_area_tag.as_deref() else {
            return false;
        };
        if self.cfg.radius <= 0.0 || tag.is_empty() {
            return false;
        }
        !world.query(self.center, self.cfg.radius, tag).is_empty()
    }

    /// A fresh candidate inside the radius. Re-entries that are still
    /// pending or captured are skipped so timers never duplicate.
    pub(crate) fn handle_entry(
        &mut self,
        entity: EntityId,
        tick: Tick,
        rng: &mut StreamRng,
        events: &mut Vec<SimEvent>,
    ) {
        if self.capture.is_pending(entity) || self.capture.is_captured(entity) {
            return;
        }

        events.push(SimEvent::ZoneEntered {
            tick,
            zone: self.cfg.name.clone(),
            entity,
        });

        let delay = rng.range_f32(self.cfg.min_capture_delay, self.cfg.max_capture_delay);
        self.capture.pending.insert(entity);
        self.timers
            .schedule(TimerPurpose::CaptureDelay, Some(entity), delay);
        if self.cfg.max_capture_delay > 0.0 {
            events.push(SimEvent::CaptureScheduled {
                tick,
                zone: self.cfg.name.clone(),
                entity,
                delay,
            });
        }
    }

    /// The capture delay elapsed. Captures only if the entity is still
    /// inside; a stale or departed entity is silently dropped.
    pub(crate) fn complete_capture(
        &mut self,
        entity: EntityId,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        if !self.capture.is_pending(entity) || !self.occupancy.contains(entity) {
            self.capture.pending.remove(&entity);
            return;
        }

        let frozen_y = if self.cfg.hold_captives {
            match world.position(entity) {
                Some(pos) => Some(pos.y),
                None => {
                    // Destroyed while pending: treat as already exited.
                    self.capture.pending.remove(&entity);
                    self.occupancy.remove(entity);
                    return;
                }
            }
        } else {
            None
        };

        self.capture.admit(entity, frozen_y);
        world.send_signal(entity, &self.cfg.react_signal);
        if self.cfg.hold_captives {
            world.pause(entity);
            world.set_captured(entity, true);
        }
        self.escalation.start(entity);

        log::debug!("tick={tick} zone={} captured entity={entity}", self.cfg.name);
        events.push(SimEvent::EntityCaptured {
            tick,
            zone: self.cfg.name.clone(),
            entity,
        });
    }

    /// An entity left the radius: cancel a pending capture or release a
    /// held one, whichever applies.
    pub(crate) fn handle_exit(
        &mut self,
        entity: EntityId,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        events.push(SimEvent::ZoneExited {
            tick,
            zone: self.cfg.name.clone(),
            entity,
        });

        if self.capture.is_pending(entity) {
            self.timers.cancel(TimerPurpose::CaptureDelay, entity);
            self.capture.pending.remove(&entity);
            events.push(SimEvent::CaptureCancelled {
                tick,
                zone: self.cfg.name.clone(),
                entity,
            });
            return;
        }

        if self.capture.is_captured(entity) {
            self.release_entity(entity, tick, world, events, false, false);
        }
    }

    /// Undo a capture: clear signal, locomotion restore, marker teardown,
    /// state removal. `immediate_resume` skips the configured post-release
    /// pause (force paths).
    pub(crate) fn release_entity(
        &mut self,
        entity: EntityId,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
        forced: bool,
        immediate_resume: bool,
    ) {
        world.send_signal(entity, &self.cfg.clear_signal);
        if self.cfg.hold_captives {
            world.set_captured(entity, false);
            if self.cfg.warp_on_release {
                world.warp_to_nearest_valid(entity);
            }
            if !immediate_resume && self.cfg.release_resume_delay > 0.0 {
                self.timers.schedule(
                    TimerPurpose::ResumeAfterRelease,
                    Some(entity),
                    self.cfg.release_resume_delay,
                );
            } else {
                world.resume(entity);
            }
        }

        self.destroy_markers_for(entity, world);
        self.capture.drop_entity(entity);
        self.escalation.remove(entity);

        events.push(SimEvent::EntityReleased {
            tick,
            zone: self.cfg.name.clone(),
            entity,
            forced,
        });
    }

    /// Release every held entity at once. Returns how many were held.
    pub(crate) fn force_release_all(
        &mut self,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) -> usize {
        let held = self.capture.captured_ids();
        for entity in &held {
            self.release_entity(*entity, tick, world, events, true, true);
        }
        // Forced paths resume immediately. Entities already released and
        // waiting out the resume delay resume now too; their timer must not
        // outlive this sweep, and dropping it without resuming would leave
        // them paused forever.
        for entry in self.timers.cancel_all(TimerPurpose::ResumeAfterRelease) {
            if let Some(entity) = entry.entity {
                world.resume(entity);
            }
        }
        self.occupancy.clear();
        held.len()
    }

    /// Cancel every pending delayed capture. Returns how many there were.
    pub(crate) fn cancel_all_pending(
        &mut self,
        tick: Tick,
        events: &mut Vec<SimEvent>,
    ) -> usize {
        let pending = self.capture.pending_ids();
        for entity in &pending {
            self.timers.cancel(TimerPurpose::CaptureDelay, *entity);
            self.capture.pending.remove(entity);
            events.push(SimEvent::CaptureCancelled {
                tick,
                zone: self.cfg.name.clone(),
                entity: *entity,
            });
        }
        pending.len()
    }

    /// Record a freshly spawned marker handle, shedding any handles whose
    /// markers have since expired so a long-held entity never accumulates
    /// dead ones.
    pub(crate) fn track_marker(
        &mut self,
        entity: EntityId,
        handle: MarkerHandle,
        world: &dyn World,
    ) {
        let handles = self.markers.entry(entity).or_default();
        handles.retain(|h| world.marker_alive(*h));
        handles.push(handle);
    }

    pub(crate) fn destroy_markers_for(&mut self, entity: EntityId, world: &mut dyn World) {
        if let Some(handles) = self.markers.remove(&entity) {
            for handle in handles {
                world.destroy_marker(handle);
            }
        }
    }
}
