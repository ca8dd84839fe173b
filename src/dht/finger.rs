//! Finger table of the ring DHT.
//!
//! Each machine keeps one entry per bit of the identifier space. Entry `i`
//! caches the successor of the target `(self + 2^i) mod 2^m` as it stood at
//! the most recent rebuild. The cached slot is a non-owning handle into the
//! ring arena; the membership layer rebuilds every table on every join and
//! leave, so a handle is never read across a membership change.

use serde::Deserialize;
use serde::Serialize;

use super::ring::successor_slot;
use super::space::IdSpace;

/// One cached forwarding entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerEntry {
    /// The target `(owner + 2^i) mod 2^m` this entry covers.
    pub start: u32,
    /// Arena slot of the cached successor.
    pub slot: usize,
    /// Id of the cached successor.
    pub machine: u32,
}

/// Finger table of a single machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    owner: u32,
    entries: Vec<FingerEntry>,
}

impl FingerTable {
    /// Empty table for `owner`; filled by the first rebuild.
    pub fn new(owner: u32) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    /// Id of the machine this table belongs to.
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Number of cached entries: one per bit of the space after a rebuild.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has never been rebuilt and holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for exponent `index`, when the table has one.
    pub fn get(&self, index: usize) -> Option<&FingerEntry> {
        self.entries.get(index)
    }

    /// All entries in ascending target order.
    pub fn entries(&self) -> &[FingerEntry] {
        &self.entries
    }

    /// Recompute every entry against the current membership.
    ///
    /// `sorted_ids` is the full machine list in ascending id order; slot k in
    /// the arena holds the machine with `sorted_ids[k]`.
    pub fn rebuild(&mut self, space: IdSpace, sorted_ids: &[u32]) {
        debug_assert!(!sorted_ids.is_empty());
        self.entries.clear();
        for exp in 0..space.bits() {
            let start = space.finger_target(self.owner, exp);
            let slot = successor_slot(sorted_ids, start);
            self.entries.push(FingerEntry {
                start,
                slot,
                machine: sorted_ids[slot],
            });
        }
        tracing::trace!(
            "rebuilt finger table of machine {} with {} entries",
            self.owner,
            self.entries.len()
        );
    }

    /// The furthest finger that moves toward `key` without overshooting: the
    /// entry whose machine lies in the arc `(owner, key]`.
    ///
    /// Targets ascend around the ring from the owner, so the last qualifying
    /// entry is also the longest legal jump. Returns `None` when no finger
    /// improves on staying put, in which case the caller falls back to the
    /// direct successor.
    pub fn best_hop_towards(&self, key: u32, space: IdSpace) -> Option<&FingerEntry> {
        let mut best = None;
        for entry in &self.entries {
            if entry.machine != self.owner && space.in_arc(entry.machine, self.owner, key) {
                best = Some(entry);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_for(owner: u32, ids: &[u32], space: IdSpace) -> FingerTable {
        let mut table = FingerTable::new(owner);
        table.rebuild(space, ids);
        table
    }

    #[test]
    fn test_rebuild_targets_and_successors() {
        let space = IdSpace::new(4).unwrap();
        let ids = [1, 4, 9, 11, 14];
        let table = table_for(14, &ids, space);

        assert_eq!(table.len(), 4);
        let cached: Vec<(u32, u32)> = table
            .entries()
            .iter()
            .map(|entry| (entry.start, entry.machine))
            .collect();
        // succ(15) = 1, succ(0) = 1, succ(2) = 4, succ(6) = 9.
        assert_eq!(cached, vec![(15, 1), (0, 1), (2, 4), (6, 9)]);
    }

    #[test]
    fn test_sole_machine_points_at_itself() {
        let space = IdSpace::new(4).unwrap();
        let table = table_for(7, &[7], space);
        assert_eq!(table.len(), 4);
        for entry in table.entries() {
            assert_eq!(entry.machine, 7);
            assert_eq!(entry.slot, 0);
        }
    }

    #[test]
    fn test_best_hop_is_last_qualifying_entry() {
        let space = IdSpace::new(4).unwrap();
        let ids = [2, 5, 10];
        let table = table_for(5, &ids, space);

        // Fingers of 5 cache 10, 10, 10, 2. For key 0 the arc (5, 0] admits
        // 10 but not 2, so the hop is 10.
        let hop = table.best_hop_towards(0, space).unwrap();
        assert_eq!(hop.machine, 10);

        // For key 7 nothing qualifies: 10 and 2 both overshoot.
        assert!(table.best_hop_towards(7, space).is_none());
    }

    #[test]
    fn test_self_entries_never_selected() {
        let space = IdSpace::new(4).unwrap();
        let table = table_for(7, &[7], space);
        assert!(table.best_hop_towards(3, space).is_none());
    }
}
