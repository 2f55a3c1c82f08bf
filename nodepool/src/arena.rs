//! Statically sized, correctly aligned slot storage embedded in its owner.

use core::fmt;
use core::mem::{self, ManuallyDrop, MaybeUninit};

/// End-of-list marker for the intrusive free list.
pub(crate) const NIL: usize = usize::MAX;

/// One arena slot: either a live value or, while free, the index of the next
/// free slot. `repr(C)` keeps both fields at offset 0, so a slot pointer is
/// also a valid `T` pointer.
#[repr(C)]
pub(crate) union Slot<T> {
    pub(crate) value: ManuallyDrop<T>,
    pub(crate) next_free: usize,
}

/// Inline storage for exactly `N` values of `T`.
///
/// The buffer is a value member of its owner and shares its lifetime; it is
/// never allocated or freed separately. Its contents are uninitialized until
/// a slot is handed out by [`FixedNodeAllocator`](crate::FixedNodeAllocator).
pub struct InlineArena<T, const N: usize> {
    buf: MaybeUninit<[Slot<T>; N]>,
}

impl<T, const N: usize> InlineArena<T, N> {
    /// Size in bytes of one slot, including alignment padding.
    pub const SLOT_SIZE: usize = mem::size_of::<Slot<T>>();

    /// Total size in bytes of the buffer.
    pub const BUFFER_SIZE: usize = mem::size_of::<[Slot<T>; N]>();

    const VALID: () = assert!(N >= 1, "InlineArena requires at least one slot");

    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            buf: MaybeUninit::uninit(),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Start address of the buffer.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr().cast()
    }

    /// Returns `true` if `ptr` lies inside `[start, start + BUFFER_SIZE)`.
    #[must_use]
    pub fn contains(&self, ptr: *const T) -> bool {
        let start = self.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr - start < Self::BUFFER_SIZE
    }

    /// Maps a pointer to the index of the slot it starts, or `None` if it is
    /// outside the buffer or not on a slot boundary.
    #[must_use]
    pub fn index_of(&self, ptr: *const T) -> Option<usize> {
        if !self.contains(ptr) {
            return None;
        }
        let offset = ptr as usize - self.as_ptr() as usize;
        (offset % Self::SLOT_SIZE == 0).then_some(offset / Self::SLOT_SIZE)
    }

    pub(crate) fn base(&self) -> *const Slot<T> {
        self.buf.as_ptr().cast()
    }

    pub(crate) fn base_mut(&mut self) -> *mut Slot<T> {
        self.buf.as_mut_ptr().cast()
    }

    pub(crate) fn slot(&self, index: usize) -> *const Slot<T> {
        debug_assert!(index < N, "slot {index} out of range for arena of {N}");
        self.base().wrapping_add(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> *mut Slot<T> {
        debug_assert!(index < N, "slot {index} out of range for arena of {N}");
        self.base_mut().wrapping_add(index)
    }
}

impl<T, const N: usize> Default for InlineArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for InlineArena<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineArena")
            .field("start", &self.as_ptr())
            .field("slots", &N)
            .field("buffer_size", &Self::BUFFER_SIZE)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_accounts_for_padding() {
        type Arena = InlineArena<[u8; 3], 4>;
        // A slot must also hold the free-list link.
        assert_eq!(Arena::SLOT_SIZE, mem::size_of::<usize>());
        assert_eq!(Arena::BUFFER_SIZE, 4 * mem::size_of::<usize>());
        assert_eq!(InlineArena::<u128, 2>::SLOT_SIZE, mem::size_of::<u128>());
    }

    #[test]
    fn test_alignment() {
        let arena = InlineArena::<u64, 3>::new();
        assert_eq!(arena.as_ptr() as usize % mem::align_of::<u64>(), 0);
        assert_eq!(arena.capacity(), 3);
    }

    #[test]
    fn test_contains_bounds_are_exact() {
        let arena = InlineArena::<u64, 4>::new();
        let start = arena.as_ptr().cast::<u64>();
        let slot = InlineArena::<u64, 4>::SLOT_SIZE;

        assert!(arena.contains(start));
        assert!(arena.contains(start.wrapping_byte_add(3 * slot)));
        assert!(arena.contains(start.wrapping_byte_add(4 * slot - 1)));
        assert!(!arena.contains(start.wrapping_byte_add(4 * slot)));
        assert!(!arena.contains(start.wrapping_byte_sub(1)));
    }

    #[test]
    fn test_index_of() {
        let arena = InlineArena::<u64, 4>::new();
        let start = arena.as_ptr().cast::<u64>();
        let slot = InlineArena::<u64, 4>::SLOT_SIZE;

        assert_eq!(arena.index_of(start), Some(0));
        assert_eq!(arena.index_of(start.wrapping_byte_add(2 * slot)), Some(2));
        assert_eq!(arena.index_of(start.wrapping_byte_add(1)), None);
        assert_eq!(arena.index_of(start.wrapping_byte_add(4 * slot)), None);
    }
}
