//! One-shot ending sequence.
//!
//! When the movable ending marker reaches the zone's trigger radius, the
//! zone releases everything it holds, broadcasts the ending trigger over
//! an enlarged radius (plus an optional extra classification layer), bumps
//! the per-entity completion counter exactly once, and goes dark. Deferred
//! post-ending work (walk resume, horn enable) keeps running on the
//! disabled zone's timer queue.

use std::collections::BTreeSet;

use crate::event::SimEvent;
use crate::scheduler::TimerPurpose;
use crate::types::{EntityId, Tick};
use crate::world::World;

use super::Zone;

impl Zone {
    pub(crate) fn check_ending(
        &mut self,
        tick: Tick,
        world: &mut dyn World,
        events: &mut Vec<SimEvent>,
    ) {
        if self.ending_activated
            || self.cfg.end_radius <= 0.0
            || self.cfg.ending_tag.is_empty()
        {
            return;
        }
        if world
            .query(self.center, self.cfg.end_radius, &self.cfg.ending_tag)
            .is_empty()
        {
            return;
        }

        self.ending_activated = true;
        log::info!("tick={tick} zone={} ending triggered", self.cfg.name);

        // Held entities are released first so the exit-before-ending order
        // holds, then folded back into the broadcast below.
        let held = self.capture.captured_ids();
        self.force_release_all(tick, world, events);
        self.cancel_all_pending(tick, events);
        self.clear_ring(world);

        let mut reached: BTreeSet<EntityId> = world
            .query(
                self.center,
                self.cfg.radius * self.cfg.end_broadcast_multiplier,
                &self.cfg.person_tag,
            )
            .into_iter()
            .collect();
        if let Some(extra) = &self.cfg.extra_end_layer {
            reached.extend(world.query(
                self.center,
                self.cfg.radius * extra.radius_multiplier,
                &extra.tag,
            ));
        }
        reached.extend(held);

        for entity in reached.iter().copied() {
            world.send_signal(entity, &self.cfg.end_signal);
            world.pause(entity);
            self.timers.schedule(
                TimerPurpose::ResumeAfterEnd,
                Some(entity),
                self.cfg.resume_walk_delay,
            );
        }
        events.push(SimEvent::EndingTriggered {
            tick,
            zone: self.cfg.name.clone(),
            broadcast: reached.len(),
        });

        if !self.end_count_given && !self.cfg.completion_counter.is_empty() {
            let entities = world.all_entities();
            for entity in entities.iter().copied() {
                let next = world.counter(entity, &self.cfg.completion_counter) + 1;
                world.set_counter(entity, &self.cfg.completion_counter, next);
            }
            self.end_count_given = true;
            events.push(SimEvent::CompletionCounted {
                tick,
                zone: self.cfg.name.clone(),
                entities: entities.len(),
            });
        }

        if let Some(horn) = &self.cfg.horn {
            self.timers
                .schedule(TimerPurpose::EnableHorns, None, horn.enable_delay);
        }

        self.enabled = false;
    }
}
