//! Identifier-space arithmetic.
//!
//! Machine ids and file keys live in the finite ring `[0, 2^m)` for a
//! configured width `m`. Everything here is plain modular arithmetic; the
//! membership and routing layers build on the arc test to decide ownership
//! and forwarding.

use serde::Deserialize;
use serde::Serialize;

use crate::consts::MAX_BITS;
use crate::consts::MIN_BITS;
use crate::error::Error;
use crate::error::Result;

/// The identifier space `[0, 2^m)`.
///
/// Copy-cheap handle passed by value throughout the crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSpace {
    bits: u8,
}

impl IdSpace {
    /// Build a space of `bits` width. `bits` must be 1..=31.
    pub fn new(bits: u8) -> Result<Self> {
        if !(MIN_BITS..=MAX_BITS).contains(&bits) {
            return Err(Error::BitsOutOfRange(bits));
        }
        Ok(Self { bits })
    }

    /// Width of the space in bits.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of ids in the space, `2^bits`.
    pub fn modulus(&self) -> u32 {
        1 << self.bits
    }

    /// Largest legal id.
    pub fn max_id(&self) -> u32 {
        self.modulus() - 1
    }

    /// Whether `id` fits into the space.
    pub fn contains(&self, id: u32) -> bool {
        id < self.modulus()
    }

    /// Validate `id`, returning it unchanged on success.
    pub fn check(&self, id: u32) -> Result<u32> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(Error::IdOutOfSpace {
                id,
                modulus: self.modulus(),
            })
        }
    }

    /// Reduce an unbounded value into the space.
    pub fn wrap(&self, value: u64) -> u32 {
        (value % u64::from(self.modulus())) as u32
    }

    /// The i-th finger target of `id`: `(id + 2^exp) mod 2^bits`.
    pub fn finger_target(&self, id: u32, exp: u8) -> u32 {
        self.wrap(u64::from(id) + (1u64 << exp))
    }

    /// Whether `id` lies on the arc `(from, to]` walked clockwise.
    ///
    /// `from == to` degenerates to the full circle; callers rely on that for
    /// the sole-machine case.
    pub fn in_arc(&self, id: u32, from: u32, to: u32) -> bool {
        if from < to {
            id > from && id <= to
        } else {
            id > from || id <= to
        }
    }
}
