//! Hash-indexed set of currently overlapping pairs (§4.3).

use std::collections::HashMap;

use crate::collision::aabb::PairKey;

/// Per-axis overlap bits; a pair is only "present" once all three are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisOverlap(u8);

impl AxisOverlap {
    const ALL_AXES: u8 = 0b111;

    pub fn set(&mut self, axis: usize, overlapping: bool) {
        let bit = 1 << axis;
        if overlapping {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn is_full(&self) -> bool {
        self.0 == Self::ALL_AXES
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairRecord {
    pub axis_overlap: AxisOverlap,
}

/// What changed in the pair set as a result of a broad-phase event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairEvent {
    Added,
    Removed,
}

#[derive(Default)]
pub struct PairManager {
    pairs: HashMap<PairKey, PairRecord>,
}

impl PairManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert: returns `Some(PairEvent::Added)` only the first
    /// time this key is seen with all three axes overlapping.
    pub fn insert_pair(&mut self, key: PairKey) -> &mut PairRecord {
        self.pairs.entry(key).or_default()
    }

    pub fn mark_axis(&mut self, key: PairKey, axis: usize, overlapping: bool) -> Option<PairEvent> {
        let record = self.pairs.entry(key).or_default();
        let was_full = record.axis_overlap.is_full();
        record.axis_overlap.set(axis, overlapping);
        let is_full = record.axis_overlap.is_full();
        let is_empty = record.axis_overlap.0 == 0;

        let event = match (was_full, is_full) {
            (false, true) => Some(PairEvent::Added),
            (true, false) => Some(PairEvent::Removed),
            _ => None,
        };

        if is_empty {
            self.pairs.remove(&key);
        }

        event
    }

    pub fn remove_pair(&mut self, key: PairKey) -> bool {
        self.pairs.remove(&key).is_some()
    }

    pub fn remove_body(&mut self, body_index: usize) -> Vec<PairKey> {
        let removed: Vec<PairKey> = self
            .pairs
            .keys()
            .copied()
            .filter(|k| k.a.index() == body_index || k.b.index() == body_index)
            .collect();
        for key in &removed {
            self.pairs.remove(key);
        }
        removed
    }

    pub fn contains(&self, key: PairKey) -> bool {
        self.pairs.get(&key).map(|r| r.axis_overlap.is_full()).unwrap_or(false)
    }

    pub fn lookup(&self, key: PairKey) -> Option<&PairRecord> {
        self.pairs.get(&key)
    }

    /// Stable iteration within a single broad-phase step: pairs are walked
    /// in a deterministic order derived from their canonical key.
    pub fn iter_present(&self) -> impl Iterator<Item = PairKey> + '_ {
        let mut keys: Vec<PairKey> = self
            .pairs
            .iter()
            .filter(|(_, r)| r.axis_overlap.is_full())
            .map(|(k, _)| *k)
            .collect();
        keys.sort_by_key(|k| (k.a.index(), k.b.index()));
        keys.into_iter()
    }

    /// Count of *present* pairs (all three axes overlapping), not raw
    /// bookkeeping records — a partial-axis record is not a pair (§4.3).
    pub fn len(&self) -> usize {
        self.pairs.values().filter(|r| r.axis_overlap.is_full()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::EntityId;

    #[test]
    fn pair_becomes_present_only_when_all_axes_overlap() {
        let mut mgr = PairManager::new();
        let key = PairKey::new(EntityId::new(0, 0), EntityId::new(1, 0));

        assert_eq!(mgr.mark_axis(key, 0, true), None);
        assert_eq!(mgr.mark_axis(key, 1, true), None);
        assert_eq!(mgr.mark_axis(key, 2, true), Some(PairEvent::Added));
        assert!(mgr.contains(key));

        assert_eq!(mgr.mark_axis(key, 0, false), Some(PairEvent::Removed));
        assert!(!mgr.contains(key));
    }
}
