//! Error of ring_dht.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collection in ring_dht.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Identifier-space width outside the supported 1..=31 bits.
    #[error("Identifier space must be 1..=31 bits, got {0}")]
    BitsOutOfRange(u8),

    /// B-tree order outside the supported 3..=100.
    #[error("B-tree order must be 3..=100, got {0}")]
    OrderOutOfRange(usize),

    /// An id or file key does not fit into the identifier space.
    #[error("Id {id} is outside the identifier space [0, {modulus})")]
    IdOutOfSpace {
        /// The offending id.
        id: u32,
        /// Size of the identifier space.
        modulus: u32,
    },

    /// A machine with this id is already on the ring.
    #[error("Machine {0} already exists on the ring")]
    MachineExists(u32),

    /// No machine with this id is on the ring.
    #[error("Machine {0} is not on the ring")]
    MachineNotFound(u32),

    /// The operation needs at least one machine.
    #[error("The ring has no machines")]
    EmptyRing,

    /// A file with this key is already stored on the responsible machine.
    #[error("File key {0} is already stored on machine {1}")]
    DuplicateFileKey(u32, u32),

    /// The lookup terminated under the loop guard before reaching the
    /// responsible machine. Should not happen while finger tables match the
    /// current membership.
    #[error("Lookup from machine {start} stalled at machine {stalled}, responsible machine is {responsible}")]
    RoutingUnreachable {
        /// Machine the lookup started from.
        start: u32,
        /// Machine the lookup stopped at.
        stalled: u32,
        /// Machine that actually owns the key.
        responsible: u32,
    },

    /// A per-machine index failed its shape check.
    #[error("Index invariant violated: {0}")]
    IndexCorrupted(String),

    /// IOError.
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("Config deserialization error")]
    ConfigParse(#[source] toml::de::Error),
}
