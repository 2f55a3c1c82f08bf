use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};
use core::slice;

use crate::error::PoolError;
use crate::overflow::OverflowAllocator;

/// `B` chain heads immediately followed by the sentinel slot. `repr(C)` with
/// a single element type guarantees the `B + 1` slots are contiguous.
#[repr(C)]
struct InlineBuckets<P, const B: usize> {
    heads: [Option<P>; B],
    sentinel: Option<P>,
}

/// A bucket array of `count + 1` slots obtained from an overflow allocator.
///
/// The block has no destructor of its own: it must be handed back with
/// [`HeapBuckets::release`] to the allocator it came from.
pub struct HeapBuckets<P> {
    ptr: NonNull<Option<P>>,
    count: usize,
}

impl<P: Copy> HeapBuckets<P> {
    fn layout(count: usize) -> Option<Layout> {
        Layout::array::<Option<P>>(count.checked_add(1)?).ok()
    }

    /// Allocates `count` empty chain heads plus the sentinel.
    ///
    /// # Errors
    ///
    /// Forwards `PoolError::OutOfMemory` from `alloc`, and reports it as well
    /// when the array size overflows `isize`.
    pub fn allocate<A: OverflowAllocator>(count: usize, alloc: &A) -> Result<Self, PoolError> {
        debug_assert!(count >= 2, "bucket count must be at least 2");
        let layout = Self::layout(count).ok_or(PoolError::OutOfMemory {
            allocator: alloc.name(),
            size: usize::MAX,
            align: core::mem::align_of::<Option<P>>(),
        })?;
        let ptr = alloc.allocate(layout)?.cast::<Option<P>>();
        for index in 0..=count {
            #[allow(unsafe_code)]
            // SAFETY: the block holds `count + 1` elements.
            unsafe {
                ptr.as_ptr().add(index).write(None);
            }
        }
        Ok(Self { ptr, count })
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.count
    }

    fn with_sentinel(&self) -> &[Option<P>] {
        #[allow(unsafe_code)]
        // SAFETY: initialized in `allocate`, owned by `self`.
        unsafe {
            slice::from_raw_parts(self.ptr.as_ptr(), self.count + 1)
        }
    }

    fn heads_mut(&mut self) -> &mut [Option<P>] {
        #[allow(unsafe_code)]
        // SAFETY: as above; the sentinel is excluded.
        unsafe {
            slice::from_raw_parts_mut(self.ptr.as_ptr(), self.count)
        }
    }

    /// Returns the block to its allocator.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator passed to `allocate`, or one equal to it.
    #[allow(unsafe_code)]
    pub unsafe fn release<A: OverflowAllocator>(self, alloc: &A) {
        if let Some(layout) = Self::layout(self.count) {
            alloc.deallocate(self.ptr.cast(), layout);
        }
    }
}

impl<P> fmt::Debug for HeapBuckets<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBuckets")
            .field("ptr", &self.ptr)
            .field("count", &self.count)
            .finish()
    }
}

/// Bucket pointer array of a fixed hash table.
///
/// Starts out as `B` inline heads followed by a sentinel, with the same
/// lifetime as its owner. A table that is allowed to overflow may grow into a
/// [`HeapBuckets`] block; [`FixedBucketStorage::reset_inline`] returns it to
/// the inline array. In both forms the slot after the last head is the
/// sentinel, which is always `None` and is not reachable through `heads_mut`.
pub struct FixedBucketStorage<P, const B: usize> {
    inline: InlineBuckets<P, B>,
    spilled: Option<HeapBuckets<P>>,
}

impl<P: Copy, const B: usize> FixedBucketStorage<P, B> {
    const VALID: () = assert!(B >= 2, "FixedBucketStorage requires at least 2 buckets");

    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            inline: InlineBuckets {
                heads: [None; B],
                sentinel: None,
            },
            spilled: None,
        }
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.spilled.as_ref().map_or(B, HeapBuckets::bucket_count)
    }

    /// Returns `true` when the array lives in overflow-allocated memory.
    #[must_use]
    pub fn is_spilled(&self) -> bool {
        self.spilled.is_some()
    }

    /// Chain heads, sentinel excluded.
    #[must_use]
    pub fn heads(&self) -> &[Option<P>] {
        let all = self.with_sentinel();
        &all[..all.len() - 1]
    }

    /// Mutable chain heads, sentinel excluded.
    pub fn heads_mut(&mut self) -> &mut [Option<P>] {
        match &mut self.spilled {
            Some(heap) => heap.heads_mut(),
            None => &mut self.inline.heads[..],
        }
    }

    /// All `bucket_count() + 1` slots, sentinel last.
    #[must_use]
    pub fn with_sentinel(&self) -> &[Option<P>] {
        match &self.spilled {
            Some(heap) => heap.with_sentinel(),
            None => {
                #[allow(unsafe_code)]
                // SAFETY: `InlineBuckets` is `repr(C)` with `B` heads directly
                // followed by one more `Option<P>`, so `B + 1` slots are contiguous.
                unsafe {
                    slice::from_raw_parts(ptr::addr_of!(self.inline).cast::<Option<P>>(), B + 1)
                }
            }
        }
    }

    /// Returns `true` if the sentinel slot is still empty.
    #[must_use]
    pub fn sentinel_intact(&self) -> bool {
        matches!(self.with_sentinel().last(), Some(None))
    }

    pub fn clear_heads(&mut self) {
        self.heads_mut().fill(None);
    }

    /// Switches to `heap`, returning the previously active heap block, if any,
    /// for the caller to release. The inline heads are emptied.
    pub fn install(&mut self, heap: HeapBuckets<P>) -> Option<HeapBuckets<P>> {
        self.inline.heads = [None; B];
        self.spilled.replace(heap)
    }

    /// Returns to the empty inline array, handing back any heap block.
    pub fn reset_inline(&mut self) -> Option<HeapBuckets<P>> {
        self.inline.heads = [None; B];
        self.spilled.take()
    }

    /// Address of the inline array.
    #[must_use]
    pub fn inline_ptr(&self) -> *const Option<P> {
        self.inline.heads.as_ptr()
    }
}

impl<P: Copy, const B: usize> Default for FixedBucketStorage<P, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy, const B: usize> fmt::Debug for FixedBucketStorage<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBucketStorage")
            .field("bucket_count", &self.bucket_count())
            .field("spilled", &self.is_spilled())
            .finish()
    }
}
