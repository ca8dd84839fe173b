//! The DHT ring: membership, finger tables, and key lookup.
//!
//! Based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! Machines form a cyclic ring over the identifier space; each keeps one
//! finger per bit of the space and the lookup walks them in O(log n) hops.
//! This is a single-process correctness model: hops are direct traversals of
//! the arena, and every membership change rebuilds every finger table.

pub mod finger;
pub mod ring;
pub mod router;
pub mod space;

pub use finger::FingerEntry;
pub use finger::FingerTable;
pub use ring::Machine;
pub use ring::Ring;
pub use router::route;
pub use space::IdSpace;
