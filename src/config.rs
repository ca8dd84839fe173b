//! Startup configuration.
//!
//! Consumed once when the simulator boots: identifier-space width, B-tree
//! order, and how the initial machine ids are produced. Read from a TOML
//! file; the CLI flags override individual fields.

use std::collections::HashSet;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::consts::DEFAULT_BITS;
use crate::consts::DEFAULT_ORDER;
use crate::dht::space::IdSpace;
use crate::error::Error;
use crate::error::Result;
use crate::hash::NameHasher;

/// How the initial machine ids are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdAssignment {
    /// Ids listed verbatim in `machines`.
    #[default]
    Manual,
    /// Ids hashed from `names`, probing linearly on collision.
    Hash,
    /// `count` random unique ids.
    Random,
}

/// Startup configuration of the simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identifier-space width in bits.
    #[serde(default = "default_bits")]
    pub bits: u8,
    /// B-tree order of the per-machine indexes.
    #[serde(default = "default_order")]
    pub order: usize,
    /// Id-assignment mode for the initial machines.
    #[serde(default)]
    pub assignment: IdAssignment,
    /// Initial machine ids (manual mode).
    #[serde(default)]
    pub machines: Vec<u32>,
    /// Initial machine names (hash mode).
    #[serde(default)]
    pub names: Vec<String>,
    /// Number of machines to generate (random mode).
    #[serde(default)]
    pub count: usize,
}

fn default_bits() -> u8 {
    DEFAULT_BITS
}

fn default_order() -> usize {
    DEFAULT_ORDER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
            order: DEFAULT_ORDER,
            assignment: IdAssignment::Manual,
            machines: Vec::new(),
            names: Vec::new(),
            count: 0,
        }
    }
}

impl Config {
    /// Read a configuration from a TOML file.
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(Error::ConfigParse)
    }

    /// Produce the initial machine ids for the configured assignment mode.
    ///
    /// Hash mode probes linearly past occupied ids, the way the original
    /// assigns hashed machine names; a name is skipped with a warning once
    /// the whole space has been probed. Random mode draws unique ids until
    /// `count` is reached or the attempt budget runs out.
    pub fn machine_ids(&self, space: IdSpace, hasher: &dyn NameHasher) -> Vec<u32> {
        match self.assignment {
            IdAssignment::Manual => self.machines.clone(),
            IdAssignment::Hash => {
                let mut ids = Vec::with_capacity(self.names.len());
                let mut taken = HashSet::new();
                for name in &self.names {
                    let first = hasher.key_of(name, space);
                    let mut id = first;
                    while taken.contains(&id) {
                        id = space.wrap(u64::from(id) + 1);
                        if id == first {
                            break;
                        }
                    }
                    if taken.contains(&id) {
                        tracing::warn!("identifier space exhausted, skipping machine {:?}", name);
                        continue;
                    }
                    taken.insert(id);
                    ids.push(id);
                }
                ids
            }
            IdAssignment::Random => {
                let mut rng = rand::thread_rng();
                let mut taken = HashSet::new();
                let mut ids = Vec::with_capacity(self.count);
                let budget = (self.count as u64).saturating_mul(u64::from(space.modulus()));
                let mut attempts = 0u64;
                while ids.len() < self.count && attempts < budget {
                    attempts += 1;
                    let id = rng.gen_range(0..space.modulus());
                    if taken.insert(id) {
                        ids.push(id);
                    }
                }
                if ids.len() < self.count {
                    tracing::warn!(
                        "generated {} of {} requested machine ids",
                        ids.len(),
                        self.count
                    );
                }
                ids
            }
        }
    }
}
