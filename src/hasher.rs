//! Stable hashing used to place users into buckets.
use std::io::Cursor;

use murmur3::murmur3_32;

/// A deterministic 32-bit hash over bytes.
///
/// Any implementation must return the same value for the same `(seed, input)` on every host,
/// otherwise users get reshuffled between processes.
pub trait StableHasher {
    /// Hash `input` with the given `seed`.
    fn hash(&self, seed: u32, input: &[u8]) -> u32;

    /// Hash `input` and scale the result into `[1, domain]`.
    fn bucket_value(&self, seed: u32, input: &str, domain: u32) -> u32 {
        scale_to_domain(self.hash(seed, input.as_bytes()), domain)
    }
}

/// The default hasher: MurmurHash3 (x86, 32-bit).
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Hasher;

impl StableHasher for Murmur3Hasher {
    fn hash(&self, seed: u32, input: &[u8]) -> u32 {
        // Reading from an in-memory cursor cannot fail.
        murmur3_32(&mut Cursor::new(input), seed).unwrap_or(0)
    }
}

/// Map a 32-bit hash onto `[1, domain]` as `floor(hash / 2^32 * domain) + 1`.
pub(crate) fn scale_to_domain(hash: u32, domain: u32) -> u32 {
    (((hash as u64) * (domain as u64)) >> 32) as u32 + 1
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{scale_to_domain, Murmur3Hasher, StableHasher};

    /// Hasher that counts how many times it was asked for a hash.
    #[derive(Default)]
    pub(crate) struct CountingHasher {
        pub calls: AtomicUsize,
    }

    impl CountingHasher {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StableHasher for CountingHasher {
        fn hash(&self, seed: u32, input: &[u8]) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Murmur3Hasher.hash(seed, input)
        }
    }

    #[test]
    fn murmur3_reference_vectors() {
        assert_eq!(Murmur3Hasher.hash(0, b""), 0);
        assert_eq!(Murmur3Hasher.hash(1, b""), 0x514E_28B7);
        assert_eq!(Murmur3Hasher.hash(0, b"hello"), 0x248B_FA47);
        assert_eq!(
            Murmur3Hasher.hash(0, b"The quick brown fox jumps over the lazy dog"),
            0x2E4F_F723
        );
    }

    #[test]
    fn scales_into_closed_domain() {
        assert_eq!(scale_to_domain(0, 100), 1);
        assert_eq!(scale_to_domain(u32::MAX, 100), 100);
        assert_eq!(scale_to_domain(u32::MAX, 10_000), 10_000);
        assert_eq!(scale_to_domain(1 << 31, 100), 51);
    }

    #[test]
    fn bucket_value_is_deterministic() {
        let a = Murmur3Hasher.bucket_value(1, "user-42", 100);
        let b = Murmur3Hasher.bucket_value(1, "user-42", 100);
        assert_eq!(a, b);
        assert!((1..=100).contains(&a));
    }
}
