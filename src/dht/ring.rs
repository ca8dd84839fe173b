//! Ring membership.
//!
//! The ring owns every machine in an arena sorted ascending by id; slot
//! `k + 1` (with wrap) is the successor of slot `k`, so `next` pointers and
//! finger handles are plain indices. Join and leave splice the arena, rebuild
//! every finger table from scratch, and move file records so that the
//! successor of a key always stores it. Membership operations validate first
//! and mutate after, so a rejected operation leaves the ring untouched.

use crate::dht::finger::FingerTable;
use crate::dht::space::IdSpace;
use crate::error::Error;
use crate::error::Result;
use crate::storage::btree::FileIndex;
use crate::storage::btree::FileRecord;
use crate::storage::btree::InsertOutcome;

/// Slot of the successor of `target` in an ascending id list.
pub(crate) fn successor_slot(sorted_ids: &[u32], target: u32) -> usize {
    debug_assert!(!sorted_ids.is_empty());
    let slot = sorted_ids.partition_point(|&id| id < target);
    if slot == sorted_ids.len() {
        0
    } else {
        slot
    }
}

/// A ring member: id, finger table, and the file index it is authoritative
/// for. Machines are created on join and dropped on leave; the ring owns them
/// exclusively.
#[derive(Debug, Clone)]
pub struct Machine {
    id: u32,
    finger: FingerTable,
    index: FileIndex,
}

impl Machine {
    fn new(id: u32, order: usize) -> Result<Self> {
        Ok(Self {
            id,
            finger: FingerTable::new(id),
            index: FileIndex::new(order)?,
        })
    }

    /// Machine id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The machine's finger table.
    pub fn finger(&self) -> &FingerTable {
        &self.finger
    }

    /// The machine's file index.
    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut FileIndex {
        &mut self.index
    }
}

/// The ordered cyclic ring of machines.
#[derive(Debug, Clone)]
pub struct Ring {
    space: IdSpace,
    order: usize,
    machines: Vec<Machine>,
}

impl Ring {
    /// Empty ring over `space` with per-machine indexes of `order`.
    pub fn new(space: IdSpace, order: usize) -> Result<Self> {
        // Surface a bad order at construction instead of on the first join.
        let _ = FileIndex::new(order)?;
        Ok(Self {
            space,
            order,
            machines: Vec::new(),
        })
    }

    /// The identifier space of the ring.
    pub fn space(&self) -> IdSpace {
        self.space
    }

    /// B-tree order of the per-machine indexes.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of machines.
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Whether the ring has no machines.
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Whether a machine with `id` is on the ring.
    pub fn contains(&self, id: u32) -> bool {
        self.slot_of(id).is_some()
    }

    /// Machines in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    /// Machine by id.
    pub fn machine(&self, id: u32) -> Option<&Machine> {
        self.slot_of(id).map(|slot| &self.machines[slot])
    }

    pub(crate) fn machine_mut(&mut self, id: u32) -> Option<&mut Machine> {
        self.slot_of(id).map(|slot| &mut self.machines[slot])
    }

    pub(crate) fn slot_of(&self, id: u32) -> Option<usize> {
        self.machines.binary_search_by_key(&id, Machine::id).ok()
    }

    pub(crate) fn at(&self, slot: usize) -> &Machine {
        &self.machines[slot]
    }

    pub(crate) fn next_slot(&self, slot: usize) -> usize {
        (slot + 1) % self.machines.len()
    }

    pub(crate) fn predecessor_slot(&self, slot: usize) -> usize {
        (slot + self.machines.len() - 1) % self.machines.len()
    }

    /// The machine whose `next` is `id`. For a sole machine this is the
    /// machine itself.
    pub fn predecessor(&self, id: u32) -> Result<&Machine> {
        let slot = self.slot_of(id).ok_or(Error::MachineNotFound(id))?;
        Ok(self.at(self.predecessor_slot(slot)))
    }

    /// The machine authoritative for `key`: its successor on the ring.
    pub fn responsible_for(&self, key: u32) -> Option<&Machine> {
        if self.machines.is_empty() {
            return None;
        }
        let slot = self.machines.partition_point(|machine| machine.id < key);
        let slot = if slot == self.machines.len() { 0 } else { slot };
        Some(&self.machines[slot])
    }

    /// Add a machine, rebuild every finger table, and pull the records the
    /// new machine is now authoritative for from its successor.
    pub fn join(&mut self, id: u32) -> Result<()> {
        let id = self.space.check(id)?;
        if self.contains(id) {
            return Err(Error::MachineExists(id));
        }
        let slot = self.machines.partition_point(|machine| machine.id < id);
        self.machines.insert(slot, Machine::new(id, self.order)?);
        self.rebuild_fingers();
        if self.machines.len() > 1 {
            self.redistribute_to(slot);
        }
        tracing::info!("machine {} joined the ring", id);
        Ok(())
    }

    /// Remove a machine, handing its records to its successor first.
    pub fn leave(&mut self, id: u32) -> Result<()> {
        let slot = self.slot_of(id).ok_or(Error::MachineNotFound(id))?;
        if self.machines.len() > 1 {
            let succ_slot = self.next_slot(slot);
            let succ_id = self.machines[succ_slot].id;
            let departing = self.machines[slot].index.enumerate();
            if !departing.is_empty() {
                tracing::debug!(
                    "transferring {} record(s) from machine {} to machine {}",
                    departing.len(),
                    id,
                    succ_id
                );
            }
            for record in departing {
                let key = record.key;
                match self.machines[succ_slot].index.insert(record) {
                    InsertOutcome::Stored => {}
                    InsertOutcome::Duplicate => panic!(
                        "file key {key} from departing machine {id} collides on machine {succ_id}"
                    ),
                }
            }
        }
        self.machines.remove(slot);
        self.rebuild_fingers();
        tracing::info!("machine {} left the ring", id);
        Ok(())
    }

    /// Populate an empty ring at startup. Out-of-range and duplicate ids are
    /// skipped with a warning; fingers are rebuilt once at the end. No record
    /// hand-off happens here, the indexes are empty before the first file op.
    pub fn seed(&mut self, ids: &[u32]) -> usize {
        let mut added = 0;
        for &id in ids {
            if !self.space.contains(id) {
                tracing::warn!("machine id {} is out of range and was skipped", id);
                continue;
            }
            if self.contains(id) {
                tracing::warn!("duplicate machine id {} was skipped", id);
                continue;
            }
            let slot = self.machines.partition_point(|machine| machine.id < id);
            match Machine::new(id, self.order) {
                Ok(machine) => {
                    self.machines.insert(slot, machine);
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!("machine {} could not be created: {}", id, err);
                }
            }
        }
        if added > 0 {
            self.rebuild_fingers();
        }
        added
    }

    /// Move every record of the new machine's successor whose key now falls
    /// in the arc `(predecessor, new]` onto the new machine.
    fn redistribute_to(&mut self, slot: usize) {
        let new_id = self.machines[slot].id;
        let pred_id = self.machines[self.predecessor_slot(slot)].id;
        let succ_slot = self.next_slot(slot);
        let succ_id = self.machines[succ_slot].id;
        let space = self.space;

        let moving: Vec<FileRecord> = self.machines[succ_slot]
            .index
            .enumerate()
            .into_iter()
            .filter(|record| space.in_arc(record.key, pred_id, new_id))
            .collect();
        if moving.is_empty() {
            return;
        }
        tracing::debug!(
            "redistributing {} record(s) from machine {} to machine {}",
            moving.len(),
            succ_id,
            new_id
        );
        for record in moving {
            let key = record.key;
            let taken = self.machines[succ_slot].index.remove(key);
            assert!(taken, "record {key} vanished from machine {succ_id} during hand-off");
            match self.machines[slot].index.insert(record) {
                InsertOutcome::Stored => {}
                InsertOutcome::Duplicate => {
                    panic!("file key {key} already present on joining machine {new_id}")
                }
            }
        }
    }

    fn rebuild_fingers(&mut self) {
        if self.machines.is_empty() {
            return;
        }
        let ids: Vec<u32> = self.machines.iter().map(Machine::id).collect();
        let space = self.space;
        for machine in &mut self.machines {
            machine.finger.rebuild(space, &ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(ids: &[u32]) -> Ring {
        let mut ring = Ring::new(IdSpace::new(4).unwrap(), 3).unwrap();
        for &id in ids {
            ring.join(id).unwrap();
        }
        ring
    }

    fn store(ring: &mut Ring, machine: u32, key: u32) {
        let record = FileRecord {
            key,
            path: format!("/files/{key}"),
        };
        assert_eq!(
            ring.machine_mut(machine).unwrap().index_mut().insert(record),
            InsertOutcome::Stored
        );
    }

    #[test]
    fn test_join_keeps_ascending_order() {
        let ring = ring_with(&[9, 1, 14, 4, 11]);
        let ids: Vec<u32> = ring.iter().map(Machine::id).collect();
        assert_eq!(ids, vec![1, 4, 9, 11, 14]);
    }

    #[test]
    fn test_join_validation() {
        let mut ring = ring_with(&[4]);
        assert!(matches!(ring.join(16), Err(Error::IdOutOfSpace { .. })));
        assert!(matches!(ring.join(4), Err(Error::MachineExists(4))));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_leave_validation() {
        let mut ring = ring_with(&[4]);
        assert!(matches!(ring.leave(9), Err(Error::MachineNotFound(9))));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_successor_and_predecessor() {
        let ring = ring_with(&[2, 5, 10]);
        assert_eq!(ring.responsible_for(0).unwrap().id(), 2);
        assert_eq!(ring.responsible_for(3).unwrap().id(), 5);
        assert_eq!(ring.responsible_for(10).unwrap().id(), 10);
        assert_eq!(ring.responsible_for(11).unwrap().id(), 2);

        assert_eq!(ring.predecessor(2).unwrap().id(), 10);
        assert_eq!(ring.predecessor(10).unwrap().id(), 5);
    }

    #[test]
    fn test_sole_machine_is_its_own_predecessor() {
        let ring = ring_with(&[7]);
        assert_eq!(ring.predecessor(7).unwrap().id(), 7);
        assert_eq!(ring.responsible_for(0).unwrap().id(), 7);
        assert_eq!(ring.responsible_for(15).unwrap().id(), 7);
    }

    #[test]
    fn test_fingers_track_membership() {
        let mut ring = ring_with(&[2, 5, 10]);
        for op in [12u32, 7] {
            ring.join(op).unwrap();
            check_fingers(&ring);
        }
        ring.leave(5).unwrap();
        check_fingers(&ring);
    }

    fn check_fingers(ring: &Ring) {
        for machine in ring.iter() {
            assert_eq!(machine.finger().len(), ring.space().bits() as usize);
            for (exp, entry) in machine.finger().entries().iter().enumerate() {
                let target = ring.space().finger_target(machine.id(), exp as u8);
                assert_eq!(entry.start, target);
                assert_eq!(
                    entry.machine,
                    ring.responsible_for(target).unwrap().id(),
                    "finger {exp} of machine {}",
                    machine.id()
                );
            }
        }
    }

    #[test]
    fn test_join_pulls_records_from_successor() {
        let mut ring = ring_with(&[2, 5, 10]);
        store(&mut ring, 2, 0);
        store(&mut ring, 2, 12);
        store(&mut ring, 2, 1);

        // 12 now falls in (10, 12]; 0 and 1 stay with machine 2.
        ring.join(12).unwrap();
        let on_new: Vec<u32> = ring
            .machine(12)
            .unwrap()
            .index()
            .enumerate()
            .iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(on_new, vec![12]);
        assert!(ring.machine(2).unwrap().index().contains(0));
        assert!(ring.machine(2).unwrap().index().contains(1));
        assert!(!ring.machine(2).unwrap().index().contains(12));
    }

    #[test]
    fn test_leave_hands_all_records_to_successor() {
        let mut ring = ring_with(&[2, 5, 10, 12]);
        store(&mut ring, 12, 11);
        store(&mut ring, 12, 12);

        ring.leave(12).unwrap();
        assert!(ring.machine(2).unwrap().index().contains(11));
        assert!(ring.machine(2).unwrap().index().contains(12));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_sole_machine_leave_empties_the_ring() {
        let mut ring = ring_with(&[7]);
        store(&mut ring, 7, 3);
        ring.leave(7).unwrap();
        assert!(ring.is_empty());
    }

    #[test]
    fn test_seed_skips_invalid_ids() {
        let mut ring = Ring::new(IdSpace::new(4).unwrap(), 3).unwrap();
        let added = ring.seed(&[1, 99, 4, 4, 9]);
        assert_eq!(added, 3);
        let ids: Vec<u32> = ring.iter().map(Machine::id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
        check_fingers(&ring);
    }

    #[test]
    fn test_successor_slot_wraps() {
        let ids = [1, 4, 9, 11, 14];
        assert_eq!(successor_slot(&ids, 0), 0);
        assert_eq!(successor_slot(&ids, 4), 1);
        assert_eq!(successor_slot(&ids, 5), 2);
        assert_eq!(successor_slot(&ids, 15), 0);
    }
}
