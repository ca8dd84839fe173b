//! Greedy key lookup across finger tables.
//!
//! A lookup starts at any machine and repeatedly takes the longest finger
//! jump that does not overshoot the key, falling back to the direct successor
//! when no finger qualifies. With finger tables matching the membership this
//! reaches the responsible machine in O(log n) hops; a visited set bounds the
//! walk at O(n) when they do not.

use std::collections::HashSet;

use crate::dht::ring::Ring;
use crate::error::Error;
use crate::error::Result;

/// Walk the ring from `start` to the machine responsible for `key`.
///
/// Returns every machine id visited, starting with `start` and normally
/// ending at the responsible machine. An empty ring yields an empty path. A
/// walk that revisits a machine stops where it is; callers that need the
/// guarantee compare the terminal hop against
/// [`Ring::responsible_for`](crate::dht::ring::Ring::responsible_for).
pub fn route(ring: &Ring, start: u32, key: u32) -> Result<Vec<u32>> {
    if ring.is_empty() {
        return Ok(Vec::new());
    }
    let key = ring.space().check(key)?;
    let mut slot = ring.slot_of(start).ok_or(Error::MachineNotFound(start))?;
    let mut path = vec![start];
    if ring.len() == 1 {
        return Ok(path);
    }

    let mut visited = HashSet::from([start]);
    loop {
        let current = ring.at(slot);
        let pred = ring.at(ring.predecessor_slot(slot));
        if ring.space().in_arc(key, pred.id(), current.id()) {
            return Ok(path);
        }

        let (next_slot, next_id) = match current.finger().best_hop_towards(key, ring.space()) {
            Some(entry) => {
                tracing::debug!(
                    "machine {} forwards key {} to machine {} via finger",
                    current.id(),
                    key,
                    entry.machine
                );
                (entry.slot, entry.machine)
            }
            None => {
                let next = ring.next_slot(slot);
                (next, ring.at(next).id())
            }
        };

        if !visited.insert(next_id) {
            // Stale or degenerate fingers; stop rather than cycle.
            tracing::warn!(
                "lookup for key {} from machine {} stalled at machine {}",
                key,
                start,
                current.id()
            );
            return Ok(path);
        }
        slot = next_slot;
        path.push(next_id);
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
    fn test_empty_ring_routes_nowhere() {
        let ring = Ring::new(IdSpace::new(4).unwrap(), 3).unwrap();
        assert!(route(&ring, 3, 7).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_start_is_rejected() {
        let ring = ring_with(&[2, 5]);
        assert!(matches!(
            route(&ring, 3, 7),
            Err(Error::MachineNotFound(3))
        ));
    }

    #[test]
    fn test_sole_machine_answers_immediately() {
        let ring = ring_with(&[7]);
        assert_eq!(route(&ring, 7, 0).unwrap(), vec![7]);
        assert_eq!(route(&ring, 7, 15).unwrap(), vec![7]);
    }

    #[test]
    fn test_start_already_responsible() {
        let ring = ring_with(&[2, 5, 10]);
        assert_eq!(route(&ring, 5, 4).unwrap(), vec![5]);
    }

    #[test]
    fn test_finger_walk_reaches_responsible_machine() {
        let ring = ring_with(&[1, 4, 9, 11, 14]);
        assert_eq!(route(&ring, 14, 3).unwrap(), vec![14, 1, 4]);
    }

    #[test]
    fn test_wraparound_route() {
        let ring = ring_with(&[2, 5, 10]);
        assert_eq!(route(&ring, 5, 0).unwrap(), vec![5, 10, 2]);
    }

    #[test]
    fn test_every_route_ends_at_the_successor() {
        let ring = ring_with(&[1, 4, 9, 11, 14]);
        for machine in ring.iter().map(|m| m.id()).collect::<Vec<_>>() {
            for key in 0..ring.space().modulus() {
                let path = route(&ring, machine, key).unwrap();
                assert_eq!(
                    path.last().copied(),
                    Some(ring.responsible_for(key).unwrap().id()),
                    "lookup of key {key} from machine {machine}"
                );
            }
        }
    }
}
