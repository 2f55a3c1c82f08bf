//! Whether nodes remember the hash of their key.

use core::fmt::Debug;

/// Selects what a node stores next to its value.
///
/// Caching costs eight bytes per node and saves a rehash of every key when
/// the bucket array grows. It also lets lookups reject most non-matching
/// chain entries with an integer compare.
pub trait HashCodePolicy {
    /// Per-node storage; `()` when nothing is cached.
    type Stored: Copy + Debug;

    fn store(hash: u64) -> Self::Stored;

    /// The cached hash, if this policy keeps one.
    fn cached(stored: Self::Stored) -> Option<u64>;
}

/// Keep the full 64-bit hash in every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachedHash;

impl HashCodePolicy for CachedHash {
    type Stored = u64;

    #[inline]
    fn store(hash: u64) -> u64 {
        hash
    }

    #[inline]
    fn cached(stored: u64) -> Option<u64> {
        Some(stored)
    }
}

/// Recompute hashes from the keys whenever they are needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UncachedHash;

impl HashCodePolicy for UncachedHash {
    type Stored = ();

    #[inline]
    fn store(_hash: u64) {}

    #[inline]
    fn cached(_stored: ()) -> Option<u64> {
        None
    }
}
