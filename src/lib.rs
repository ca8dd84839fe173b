#![warn(missing_docs)]
//! Chord-style consistent-hashing DHT simulator.
//!
//! A single-process correctness model of a ring DHT: machines form a cyclic
//! ring over a `2^m` identifier space, each owns a B-tree holding the file
//! records it is authoritative for, and lookups hop through per-machine
//! finger tables in O(log n) steps. There is no networking and no
//! concurrency; "messages" are direct traversals of the in-memory ring, and
//! membership operations run to completion before the next begins.
//!
//! The [`processor::Processor`] facade is the entry point: it hashes names
//! to keys, routes every file operation through the finger tables, and
//! exposes the diagnostic dumps the driver prints.

pub mod cli;
pub mod config;
pub mod consts;
pub mod dht;
pub mod error;
pub mod hash;
pub mod inspect;
pub mod logging;
pub mod processor;
pub mod storage;

pub use dht::IdSpace;
pub use dht::Ring;
pub use error::Error;
pub use error::Result;
pub use processor::Processor;
