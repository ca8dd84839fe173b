//! Name-to-key hashing.
//!
//! The core never interprets file names; it only needs a stable mapping into
//! the identifier space. The trait keeps the hash injectable so tests can pin
//! exact keys.

use sha1::Digest;
use sha1::Sha1;

use crate::dht::space::IdSpace;

/// A deterministic mapping from names into the identifier space.
pub trait NameHasher {
    /// Key of `name` in `space`.
    fn key_of(&self, name: &str, space: IdSpace) -> u32;
}

/// Default hasher: leading eight bytes of the SHA-1 digest, reduced modulo
/// the space.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha1Hasher;

impl NameHasher for Sha1Hasher {
    fn key_of(&self, name: &str, space: IdSpace) -> u32 {
        let digest = Sha1::digest(name.as_bytes());
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        space.wrap(u64::from_be_bytes(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_stable_and_in_range() {
        let space = IdSpace::new(4).unwrap();
        let hasher = Sha1Hasher;
        for name in ["", "a", "some/long/path.txt", "☃"] {
            let key = hasher.key_of(name, space);
            assert!(space.contains(key));
            assert_eq!(key, hasher.key_of(name, space));
        }
    }

    #[test]
    fn test_different_spaces_reduce_differently() {
        let hasher = Sha1Hasher;
        let narrow = IdSpace::new(4).unwrap();
        let wide = IdSpace::new(20).unwrap();
        let key = hasher.key_of("movie.mkv", wide);
        assert_eq!(hasher.key_of("movie.mkv", narrow), key % 16);
    }
}
