//! Diagnostic views of the ring, finger tables, and file indexes.
//!
//! Everything the driver prints comes from these serde-friendly snapshots;
//! together they carry enough to verify the ring order, the authority arcs,
//! the finger caches, and the index shapes by inspection.

use serde::Deserialize;
use serde::Serialize;

use crate::dht::ring::Machine;
use crate::dht::ring::Ring;
use crate::storage::btree::FileRecord;

/// Snapshot of the whole ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingInspect {
    /// Identifier-space width in bits.
    pub bits: u8,
    /// Number of machines on the ring.
    pub machine_count: usize,
    /// Per-machine summaries in ascending id order.
    pub machines: Vec<MachineInspect>,
}

/// One machine in a [`RingInspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInspect {
    /// Machine id.
    pub id: u32,
    /// Id of the next machine on the ring.
    pub successor: u32,
    /// Number of files stored here.
    pub files: usize,
    /// The arc of keys this machine is authoritative for.
    pub range: AuthorityRange,
}

/// The key arc `(predecessor, self]`, split at the wrap point when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRange {
    /// First inclusive span of owned keys.
    pub first: (u32, u32),
    /// Second span when the arc wraps past the top of the space.
    pub second: Option<(u32, u32)>,
}

/// Snapshot of one machine's finger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTableInspect {
    /// Machine the table belongs to.
    pub machine: u32,
    /// Entries in ascending target order.
    pub entries: Vec<FingerEntryInspect>,
}

/// One row of a [`FingerTableInspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerEntryInspect {
    /// Exponent i of the entry.
    pub index: u8,
    /// The target `(machine + 2^i) mod 2^m`.
    pub start: u32,
    /// Cached successor of the target.
    pub successor: u32,
}

/// Snapshot of one machine's file index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInspect {
    /// Machine the index belongs to.
    pub machine: u32,
    /// Configured B-tree order.
    pub order: usize,
    /// Number of files stored.
    pub files: usize,
    /// Keys per node per level, top down.
    pub levels: Vec<Vec<Vec<u32>>>,
    /// Flat record listing in breadth-first order.
    pub records: Vec<FileRecord>,
}

impl RingInspect {
    /// Snapshot `ring`.
    pub fn inspect(ring: &Ring) -> Self {
        let machines = ring
            .iter()
            .map(|machine| MachineInspect {
                id: machine.id(),
                successor: ring
                    .responsible_for(ring.space().wrap(u64::from(machine.id()) + 1))
                    .map(Machine::id)
                    .unwrap_or(machine.id()),
                files: machine.index().len(),
                range: AuthorityRange::of(ring, machine.id()),
            })
            .collect();
        Self {
            bits: ring.space().bits(),
            machine_count: ring.len(),
            machines,
        }
    }
}

impl AuthorityRange {
    /// The arc of keys machine `id` owns under the current membership.
    pub fn of(ring: &Ring, id: u32) -> Self {
        let max = ring.space().max_id();
        let pred = ring
            .predecessor(id)
            .map(Machine::id)
            .unwrap_or(id);
        if pred == id {
            // Sole machine: the whole space.
            return Self {
                first: (0, max),
                second: None,
            };
        }
        let start = ring.space().wrap(u64::from(pred) + 1);
        if start <= id {
            Self {
                first: (start, id),
                second: None,
            }
        } else {
            Self {
                first: (start, max),
                second: Some((0, id)),
            }
        }
    }
}

impl FingerTableInspect {
    /// Snapshot `machine`'s finger table.
    pub fn inspect(machine: &Machine) -> Self {
        Self {
            machine: machine.id(),
            entries: machine
                .finger()
                .entries()
                .iter()
                .enumerate()
                .map(|(i, entry)| FingerEntryInspect {
                    index: i as u8,
                    start: entry.start,
                    successor: entry.machine,
                })
                .collect(),
        }
    }
}

impl IndexInspect {
    /// Snapshot `machine`'s file index.
    pub fn inspect(machine: &Machine) -> Self {
        Self {
            machine: machine.id(),
            order: machine.index().order(),
            files: machine.index().len(),
            levels: machine.index().levels(),
            records: machine.index().enumerate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::space::IdSpace;

    fn ring_with(ids: &[u32]) -> Ring {
        let mut ring = Ring::new(IdSpace::new(4).unwrap(), 3).unwrap();
        for &id in ids {
            ring.join(id).unwrap();
        }
        ring
    }

    #[test]
    fn test_ring_inspect_lists_machines_in_order() {
        let ring = ring_with(&[10, 2, 5]);
        let inspect = RingInspect::inspect(&ring);
        assert_eq!(inspect.machine_count, 3);
        let ids: Vec<u32> = inspect.machines.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 5, 10]);
        let successors: Vec<u32> = inspect.machines.iter().map(|m| m.successor).collect();
        assert_eq!(successors, vec![5, 10, 2]);
    }

    #[test]
    fn test_authority_range_wraps() {
        let ring = ring_with(&[2, 5, 10]);
        // Machine 2 owns (10, 2]: keys 11..15 and 0..2.
        let range = AuthorityRange::of(&ring, 2);
        assert_eq!(range.first, (11, 15));
        assert_eq!(range.second, Some((0, 2)));
        // Machine 5 owns the plain span (2, 5].
        let range = AuthorityRange::of(&ring, 5);
        assert_eq!(range.first, (3, 5));
        assert_eq!(range.second, None);
    }

    #[test]
    fn test_sole_machine_owns_everything() {
        let ring = ring_with(&[7]);
        let range = AuthorityRange::of(&ring, 7);
        assert_eq!(range.first, (0, 15));
        assert_eq!(range.second, None);
    }
}
