//! Pluggable heap delegate used once the inline arena is exhausted.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::PoolError;

/// A fallback allocator consulted only when the inline arena has no free slot
/// (or when a bucket array outgrows its inline storage).
///
/// Equality means "interchangeable": memory obtained from one instance may be
/// returned through any instance that compares equal to it.
pub trait OverflowAllocator: Clone + PartialEq {
    /// Allocates a block for `layout`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::OutOfMemory` if the block cannot be provided.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, PoolError>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator (or one
    /// equal to it) with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Debug name used in diagnostics and error values.
    fn name(&self) -> &'static str {
        "overflow"
    }
}

/// The process-wide heap, reached through `alloc::alloc`.
#[derive(Clone, Copy, Debug)]
pub struct Global {
    name: &'static str,
}

impl Global {
    /// Default debug name of the global overflow allocator.
    pub const DEFAULT_NAME: &'static str = "nodepool overflow";

    #[must_use]
    pub const fn new() -> Self {
        Self::named(Self::DEFAULT_NAME)
    }

    /// Creates a global allocator handle carrying a memory-tracking tag.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for Global {
    fn default() -> Self {
        Self::new()
    }
}

// Every handle reaches the same heap, so any two are interchangeable
// regardless of their name tag.
impl PartialEq for Global {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Global {}

impl OverflowAllocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, PoolError> {
        let ptr = if layout.size() == 0 {
            // Aligned dangling address, never dereferenced.
            layout.align() as *mut u8
        } else {
            #[allow(unsafe_code)]
            // SAFETY: layout has a non-zero size.
            unsafe {
                alloc::alloc::alloc(layout)
            }
        };
        NonNull::new(ptr).ok_or(PoolError::OutOfMemory {
            allocator: self.name,
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            alloc::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_round_trip() {
        let global = Global::new();
        let layout = Layout::new::<[u64; 4]>();
        let ptr = global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);
        unsafe { global.deallocate(ptr, layout) };
    }

    #[test]
    fn test_global_zero_sized() {
        let global = Global::new();
        let layout = Layout::new::<()>();
        let ptr = global.allocate(layout).unwrap();
        unsafe { global.deallocate(ptr, layout) };
    }

    #[test]
    fn test_global_instances_are_interchangeable() {
        assert_eq!(Global::named("a"), Global::named("b"));
        assert_eq!(Global::named("tag").name(), "tag");
        assert_eq!(Global::default().name(), Global::DEFAULT_NAME);
    }
}
