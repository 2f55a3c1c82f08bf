#![no_std]

//! Fixed-capacity hash containers whose nodes and initial bucket array live
//! inside the container itself.
//!
//! | Container             | Keys      | Backed by                 |
//! |-----------------------|-----------|---------------------------|
//! | [`FixedHashMap`]      | unique    | open-chaining table       |
//! | [`FixedHashSet`]      | unique    | `FixedHashMap<T, ()>`     |
//! | [`FixedHashMultimap`] | repeated  | open-chaining table       |
//! | [`FixedHashMultiset`] | repeated  | `FixedHashMultimap<T, ()>`|
//!
//! Every container takes two capacities as const generics: `N` node slots
//! in an inline arena and `B` inline chain heads. Until one of them is
//! exceeded the container performs no heap allocation at all.
//!
//! ```
//! use fixed_hash::{FixedHashMap, PoolError};
//!
//! // 3 nodes, 5 buckets, no overflow.
//! let mut map: FixedHashMap<u8, char, 3, 5, false> = FixedHashMap::new();
//! for (i, c) in "abc".chars().enumerate() {
//!     map.insert(i as u8, c).unwrap();
//! }
//! assert_eq!(map.insert(9, 'z'), Err(PoolError::CapacityExceeded { capacity: 3 }));
//! assert_eq!(map.bucket_count(), 5);
//! ```
//!
//! # Overflow
//!
//! With `OVERFLOW = true` (the default), nodes beyond `N` and grown bucket
//! arrays come from an [`OverflowAllocator`], [`Global`] unless another one
//! is supplied. The bucket array grows through prime sizes chosen by
//! [`PrimeRehashPolicy`]. With `OVERFLOW = false` the load factor is pinned
//! so the table never rehashes, and insertion past `N` elements fails with
//! [`PoolError::CapacityExceeded`].
//!
//! ```
//! use fixed_hash::FixedHashSet;
//!
//! let mut set: FixedHashSet<u32, 2, 2> = FixedHashSet::new();
//! set.try_extend(0..10).unwrap();
//! assert!(set.has_overflowed());
//! set.clear_and_free_buckets();
//! assert!(!set.has_overflowed());
//! assert_eq!(set.bucket_count(), 2);
//! ```
//!
//! # Moving and swapping
//!
//! Nodes refer to each other by slot index, not by address, so a container
//! can be moved or [`swap`](FixedHashMap::swap)ped like any Rust value.
//! Large inline capacities make for large values: instances whose size
//! exceeds [`LARGE_INLINE_FOOTPRINT`] log a warning when built, since
//! constructing them on a small thread stack can overflow it.
//!
//! # Features
//!
//! - `std`: `std::error::Error` for [`PoolError`] and foldhash's `std` support.
//! - `tracing`: debug events on overflow and bucket growth, and warnings on
//!   large instances and `reset_lose_memory` leaks.

mod hash_code;
pub mod map;
pub mod multimap;
pub mod multiset;
pub mod policy;
mod raw;
pub mod set;
mod tracing_helpers;

pub use hash_code::{CachedHash, HashCodePolicy, UncachedHash};
pub use map::FixedHashMap;
pub use multimap::FixedHashMultimap;
pub use multiset::FixedHashMultiset;
pub use nodepool::{Global, OverflowAllocator, PoolError};
pub use policy::PrimeRehashPolicy;
pub use raw::LARGE_INLINE_FOOTPRINT;
pub use set::FixedHashSet;

/// Hash builder used when none is named: foldhash with a fixed seed, so
/// iteration order is reproducible from run to run.
pub type DefaultHashBuilder = foldhash::fast::FixedState;

pub type Result<T> = core::result::Result<T, PoolError>;
