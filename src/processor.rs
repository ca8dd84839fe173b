//! Facade over the ring.
//!
//! The processor owns the ring and the name hash and exposes the operations
//! the driver calls: file put/get/del, membership join/leave, and the
//! diagnostic dumps. File operations never address a machine directly: every
//! one hashes the name, routes from the caller's start machine through the
//! finger tables, and checks the terminal hop against the membership's own
//! successor computation before touching an index.

use serde::Serialize;

use crate::config::Config;
use crate::dht::ring::Ring;
use crate::dht::router;
use crate::dht::space::IdSpace;
use crate::error::Error;
use crate::error::Result;
use crate::hash::NameHasher;
use crate::hash::Sha1Hasher;
use crate::inspect::FingerTableInspect;
use crate::inspect::IndexInspect;
use crate::inspect::RingInspect;
use crate::storage::btree::FileRecord;
use crate::storage::btree::InsertOutcome;

/// Receipt of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stored {
    /// Key the name hashed to.
    pub key: u32,
    /// Machine the record landed on.
    pub machine: u32,
    /// Machines visited on the way, starting machine first.
    pub route: Vec<u32>,
}

/// Result of a `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located {
    /// Key the name hashed to.
    pub key: u32,
    /// Machine that would store the key.
    pub machine: u32,
    /// Machines visited on the way.
    pub route: Vec<u32>,
    /// The record, when one is stored.
    pub record: Option<FileRecord>,
}

/// Result of a `del`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removed {
    /// Key the name hashed to.
    pub key: u32,
    /// Machine that would store the key.
    pub machine: u32,
    /// Machines visited on the way.
    pub route: Vec<u32>,
    /// Whether a record was actually removed.
    pub removed: bool,
}

/// The DHT facade.
pub struct Processor {
    ring: Ring,
    hasher: Box<dyn NameHasher>,
}

impl Processor {
    /// Empty ring with the default SHA-1 name hash.
    pub fn new(space: IdSpace, order: usize) -> Result<Self> {
        Self::with_hasher(space, order, Box::new(Sha1Hasher))
    }

    /// Empty ring with a caller-supplied name hash.
    pub fn with_hasher(space: IdSpace, order: usize, hasher: Box<dyn NameHasher>) -> Result<Self> {
        Ok(Self {
            ring: Ring::new(space, order)?,
            hasher,
        })
    }

    /// Build and seed a processor from a startup configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let space = IdSpace::new(config.bits)?;
        let mut processor = Self::new(space, config.order)?;
        let ids = config.machine_ids(space, processor.hasher.as_ref());
        let added = processor.ring.seed(&ids);
        tracing::info!("{} machine(s) joined during startup", added);
        Ok(processor)
    }

    /// Read-only view of the ring.
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Key `name` hashes to under the configured hash.
    pub fn key_of(&self, name: &str) -> u32 {
        self.hasher.key_of(name, self.ring.space())
    }

    /// Add a machine to the ring.
    pub fn join(&mut self, id: u32) -> Result<()> {
        self.ring.join(id)
    }

    /// Remove a machine from the ring.
    pub fn leave(&mut self, id: u32) -> Result<()> {
        self.ring.leave(id)
    }

    /// Hash `path` and store it from `start`.
    pub fn put(&mut self, start: u32, path: &str) -> Result<Stored> {
        let key = self.key_of(path);
        self.put_key(start, key, path)
    }

    /// Store `path` under an explicit `key` from `start`.
    pub fn put_key(&mut self, start: u32, key: u32, path: &str) -> Result<Stored> {
        let key = self.ring.space().check(key)?;
        let (route, machine) = self.deliver(start, key)?;
        let target = self
            .ring
            .machine_mut(machine)
            .ok_or(Error::MachineNotFound(machine))?;
        let record = FileRecord {
            key,
            path: path.to_owned(),
        };
        match target.index_mut().insert(record) {
            InsertOutcome::Stored => {
                tracing::info!("file key {} stored on machine {}", key, machine);
                Ok(Stored {
                    key,
                    machine,
                    route,
                })
            }
            InsertOutcome::Duplicate => Err(Error::DuplicateFileKey(key, machine)),
        }
    }

    /// Hash `path` and look it up from `start`.
    pub fn get(&self, start: u32, path: &str) -> Result<Located> {
        self.get_key(start, self.key_of(path))
    }

    /// Look up an explicit `key` from `start`.
    pub fn get_key(&self, start: u32, key: u32) -> Result<Located> {
        let key = self.ring.space().check(key)?;
        let (route, machine) = self.deliver(start, key)?;
        let record = self
            .ring
            .machine(machine)
            .and_then(|m| m.index().find(key))
            .cloned();
        Ok(Located {
            key,
            machine,
            route,
            record,
        })
    }

    /// Hash `path` and delete it from `start`.
    pub fn del(&mut self, start: u32, path: &str) -> Result<Removed> {
        let key = self.key_of(path);
        self.del_key(start, key)
    }

    /// Delete an explicit `key` from `start`.
    pub fn del_key(&mut self, start: u32, key: u32) -> Result<Removed> {
        let key = self.ring.space().check(key)?;
        let (route, machine) = self.deliver(start, key)?;
        let target = self
            .ring
            .machine_mut(machine)
            .ok_or(Error::MachineNotFound(machine))?;
        let removed = target.index_mut().remove(key);
        if removed {
            tracing::info!("file key {} removed from machine {}", key, machine);
        }
        Ok(Removed {
            key,
            machine,
            route,
            removed,
        })
    }

    /// Snapshot of the ring.
    pub fn dump_ring(&self) -> RingInspect {
        RingInspect::inspect(&self.ring)
    }

    /// Snapshot of one machine's finger table.
    pub fn dump_finger_table(&self, id: u32) -> Result<FingerTableInspect> {
        self.ring
            .machine(id)
            .map(FingerTableInspect::inspect)
            .ok_or(Error::MachineNotFound(id))
    }

    /// Snapshot of one machine's file index.
    pub fn dump_index(&self, id: u32) -> Result<IndexInspect> {
        self.ring
            .machine(id)
            .map(IndexInspect::inspect)
            .ok_or(Error::MachineNotFound(id))
    }

    /// Route from `start` and verify the walk landed on the machine the
    /// membership says owns `key`. A guarded stop anywhere else aborts the
    /// caller's operation before any index is touched.
    fn deliver(&self, start: u32, key: u32) -> Result<(Vec<u32>, u32)> {
        if self.ring.is_empty() {
            return Err(Error::EmptyRing);
        }
        let route = router::route(&self.ring, start, key)?;
        let last = route.last().copied().ok_or(Error::EmptyRing)?;
        let responsible = self
            .ring
            .responsible_for(key)
            .ok_or(Error::EmptyRing)?
            .id();
        if last != responsible {
            return Err(Error::RoutingUnreachable {
                start,
                stalled: last,
                responsible,
            });
        }
        Ok((route, responsible))
    }
}
