//! Cancellable deferred actions, driven by the tick's Δt.
//!
//! Every "wait, then act" step in the installation is an explicit
//! `TimerQueue` entry keyed by (entity, purpose): the randomized capture
//! delay, the post-ending resume, the post-release resume, and the horn
//! enablement. A cancelled entry never fires — cancellation removes it
//! outright.
//!
//! Each zone owns its own queue, so suspending a zone can cancel exactly
//! that zone's pending work and nothing else.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    /// Randomized delay between entity entry and capture.
    CaptureDelay,
    /// Short pause before a released entity starts walking again.
    ResumeAfterRelease,
    /// Post-ending pause before locomotion resumes and end-off fires.
    ResumeAfterEnd,
    /// Litter-variant: enable vehicle horns some time after the ending.
    EnableHorns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEntry {
    /// Entity the action is tied to; `None` for zone-wide actions.
    pub entity: Option<EntityId>,
    pub purpose: TimerPurpose,
    remaining: f32,
}

/// A flat queue of pending one-shot timers. Entries fire in scheduling
/// order once their remaining time reaches zero, which keeps the engine
/// deterministic for a given seed.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TimerQueue {
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, purpose: TimerPurpose, entity: Option<EntityId>, delay: f32) {
        self.entries.push(TimerEntry {
            entity,
            purpose,
            remaining: delay.max(0.0),
        });
    }

    /// Cancel the pending timer for one (entity, purpose) pair.
    pub fn cancel(&mut self, purpose: TimerPurpose, entity: EntityId) {
        self.entries
            .retain(|e| !(e.purpose == purpose && e.entity == Some(entity)));
    }

    /// Cancel every pending timer of one purpose, returning the removed
    /// entries so the caller can settle whatever they were deferring.
    pub fn cancel_all(&mut self, purpose: TimerPurpose) -> Vec<TimerEntry> {
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if e.purpose == purpose {
                removed.push(e.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn is_pending(&self, purpose: TimerPurpose, entity: EntityId) -> bool {
        self.entries
            .iter()
            .any(|e| e.purpose == purpose && e.entity == Some(entity))
    }

    pub fn pending_count(&self, purpose: TimerPurpose) -> usize {
        self.entries.iter().filter(|e| e.purpose == purpose).count()
    }

    /// Advance all timers by `dt` and drain the ones that are due, in
    /// scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<TimerEntry> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }
        let mut due = Vec::new();
        self.entries.retain(|entry| {
            if entry.remaining <= 0.0 {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_fires_on_first_advance() {
        let mut q = TimerQueue::new();
        q.schedule(TimerPurpose::CaptureDelay, Some(1), 0.0);
        let due = q.advance(0.1);
        assert_eq!(due.len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_entry_never_fires() {
        let mut q = TimerQueue::new();
        q.schedule(TimerPurpose::CaptureDelay, Some(7), 0.5);
        q.cancel(TimerPurpose::CaptureDelay, 7);
        for _ in 0..20 {
            assert!(q.advance(0.1).is_empty());
        }
    }

    #[test]
    fn cancel_all_returns_the_removed_entries() {
        let mut q = TimerQueue::new();
        q.schedule(TimerPurpose::ResumeAfterRelease, Some(3), 0.2);
        q.schedule(TimerPurpose::CaptureDelay, Some(4), 0.2);
        let removed = q.cancel_all(TimerPurpose::ResumeAfterRelease);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].entity, Some(3));
        assert_eq!(q.pending_count(TimerPurpose::CaptureDelay), 1);
    }

    #[test]
    fn fires_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule(TimerPurpose::ResumeAfterEnd, Some(1), 0.05);
        q.schedule(TimerPurpose::ResumeAfterEnd, Some(2), 0.05);
        let due = q.advance(0.1);
        let ids: Vec<_> = due.iter().map(|e| e.entity.unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
