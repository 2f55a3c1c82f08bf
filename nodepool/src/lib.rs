#![no_std]

//! `nodepool`: fixed-size slot allocation out of storage embedded in the owner.
//!
//! The crate provides the memory layer of a fixed-capacity container:
//!
//! - [`InlineArena`]: a correctly aligned buffer for exactly `N` values that
//!   lives inside the owning struct, with an exact address-range test.
//! - [`FixedNodeAllocator`]: hands out and reclaims slots of the arena through
//!   a bump index plus an intrusive free list, and optionally falls back to an
//!   [`OverflowAllocator`] once the arena is exhausted.
//! - [`FixedBucketStorage`]: a `B`-element head array followed by an always
//!   empty sentinel slot, which may grow into overflow memory.
//!
//! No operation allocates from the heap unless overflow is enabled and the
//! inline capacity has been used up.
//!
//! # Capacity
//!
//! With overflow disabled, asking for slot `N + 1` is a checked error:
//!
//! ```
//! # use nodepool::{FixedNodeAllocator, Global, PoolError};
//! let mut pool: FixedNodeAllocator<u32, 2, false> = FixedNodeAllocator::new();
//! let a = pool.allocate().unwrap();
//! let _b = pool.allocate().unwrap();
//! assert_eq!(pool.allocate(), Err(PoolError::CapacityExceeded { capacity: 2 }));
//!
//! // Returned slots are reused.
//! unsafe { pool.deallocate(a) };
//! assert_eq!(pool.allocate(), Ok(a));
//! ```
//!
//! With overflow enabled the same request is served by the overflow
//! allocator, and the slot remembers where it came from:
//!
//! ```
//! # use nodepool::{FixedNodeAllocator, NodePtr};
//! let mut pool: FixedNodeAllocator<u32, 1, true> = FixedNodeAllocator::new();
//! let inline = pool.allocate().unwrap();
//! let spilled = pool.allocate().unwrap();
//! assert!(matches!(inline, NodePtr::Inline(0)));
//! assert!(!spilled.is_inline());
//! assert_eq!(pool.overflow_in_use(), 1);
//! unsafe {
//!     pool.deallocate(spilled);
//!     pool.deallocate(inline);
//! }
//! assert_eq!(pool.in_use(), 0);
//! ```
//!
//! # Handles
//!
//! Slots are named by [`NodePtr`] rather than by address. Inline slots carry
//! their index, so moving the allocator (or the container that embeds it) by
//! value never invalidates outstanding handles.
//!
//! # `no_std` Compatibility
//!
//! The crate uses `core` and `alloc` only; `alloc` is reached solely through
//! [`Global`], the default overflow delegate. Enable `std` to get
//! `std::error::Error` on [`PoolError`] through `thiserror`, and `tracing` to
//! log overflow events.

extern crate alloc;

mod arena;
mod buckets;
mod error;
mod overflow;
mod pool;
mod tracing_helpers;

pub use arena::InlineArena;
pub use buckets::{FixedBucketStorage, HeapBuckets};
pub use error::PoolError;
pub use overflow::{Global, OverflowAllocator};
pub use pool::{FixedNodeAllocator, NodePtr, NodeView, NodeViewMut};
