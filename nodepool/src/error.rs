use thiserror::Error;

/// Error types for `FixedNodeAllocator` and `FixedBucketStorage` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PoolError {
    /// Every inline slot is in use and the pool was built without overflow
    #[error("Capacity exceeded: all {capacity} inline slots are in use and overflow is disabled")]
    CapacityExceeded {
        /// Number of inline slots in the arena
        capacity: usize,
    },
    /// The overflow allocator could not satisfy a request
    #[error("Out of memory: overflow allocator '{allocator}' failed to allocate {size} bytes (align {align})")]
    OutOfMemory {
        /// Debug name of the overflow allocator
        allocator: &'static str,
        /// Requested size in bytes
        size: usize,
        /// Requested alignment in bytes
        align: usize,
    },
    /// The overflow delegate would change while memory it handed out is
    /// still live, so those blocks would be freed through the wrong allocator
    #[error("Allocator in use: {outstanding} blocks from overflow allocator '{allocator}' are still live")]
    AllocatorInUse {
        /// Debug name of the current overflow allocator
        allocator: &'static str,
        /// Live blocks obtained from it
        outstanding: usize,
    },
}
