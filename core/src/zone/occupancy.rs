//! Per-tick occupancy tracking: who is inside the detection radius, who
//! just entered, who just left.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Enter/exit deltas for one tick, in id order.
#[derive(Debug, Default)]
pub struct OccupancyDelta {
    pub entered: Vec<EntityId>,
    pub exited: Vec<EntityId>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Occupancy {
    inside: BTreeSet<EntityId>,
}

impl Occupancy {
    /// Compare this tick's query result against the previous tick's and
    /// record it as the new inside-set.
    pub fn observe(&mut self, current: BTreeSet<EntityId>) -> OccupancyDelta {
        let entered = current.difference(&self.inside).copied().collect();
        let exited = self.inside.difference(&current).copied().collect();
        self.inside = current;
        OccupancyDelta { entered, exited }
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.inside.contains(&entity)
    }

    pub fn remove(&mut self, entity: EntityId) {
        self.inside.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.inside.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.inside.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }
}
